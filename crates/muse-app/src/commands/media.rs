//! `muse image` and `muse video`.

use std::path::Path;
use std::sync::Arc;

use muse_ai::attachment::{ingest_file, Transmission};
use muse_ai::content::InlineData;
use muse_ai::{AttachmentKind, GeminiClient, MediaStudio};
use muse_common::MuseError;
use muse_config::MuseConfig;
use tracing::info;

use super::cancel_on_ctrl_c;
use super::output::image_file_name;

pub async fn image(
    client: Arc<GeminiClient>,
    config: &MuseConfig,
    prompt: &str,
    count: u32,
    out: &Path,
) -> Result<(), MuseError> {
    let studio = MediaStudio::new(client, config);
    let images = studio.generate_image(&studio.image_request(prompt, count)).await?;

    tokio::fs::create_dir_all(out).await?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    for (index, image) in images.iter().enumerate() {
        let path = out.join(image_file_name(&stamp, index, &image.mime_type));
        tokio::fs::write(&path, image.decode()?).await?;
        println!("{}", path.display());
    }
    Ok(())
}

pub async fn video(
    client: Arc<GeminiClient>,
    config: &MuseConfig,
    prompt: &str,
    image: Option<&Path>,
    out: &Path,
) -> Result<(), MuseError> {
    let start_frame = match image {
        Some(path) => Some(starting_frame(path).await?),
        None => None,
    };

    let studio = MediaStudio::new(client.clone(), config);
    let request = studio.video_request(prompt, start_frame);
    let (cancel, watcher) = cancel_on_ctrl_c();
    eprintln!("Generating video, this can take a few minutes...");
    let result = studio.generate_video(&request, Some(&cancel)).await;
    watcher.abort();
    let video = result?;

    let bytes = client.download(&video.uri).await?;
    tokio::fs::write(out, &bytes).await?;
    info!(path = %out.display(), size = bytes.len(), "Video saved");
    println!("{}", out.display());
    Ok(())
}

async fn starting_frame(path: &Path) -> Result<InlineData, MuseError> {
    let attachment = ingest_file(path).await?;
    match attachment.transmission() {
        Transmission::Inline { mime_type, data } if attachment.kind == AttachmentKind::Image => {
            Ok(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            })
        }
        _ => Err(MuseError::Attachment(format!(
            "{} is not an image",
            path.display()
        ))),
    }
}
