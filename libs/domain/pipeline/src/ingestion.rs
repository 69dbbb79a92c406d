// [libs/domain/pipeline/src/ingestion.rs]
/*!
 * For each pending `DiscoveredImage`: download with a hard size cap and
 * timeout, streaming into a temp file; run face detection; and persist the
 * result. Nothing in this stage raises out — every failure mode ends in a
 * `DiscoveredImage` status transition, never a propagated error, so one bad
 * image never aborts a batch.
 */

use futures_util::StreamExt;
use reqwest::Client;
use sentinel_core_providers::FaceDetectionProvider;
use sentinel_domain_models::image::{DiscoveredImage, ImageStatus};
use sentinel_infra_db::repositories::DiscoveredImageRepository;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{instrument, warn};

pub const MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Rejects a response before its body is streamed: wrong content type, or a
/// declared length already past the cap. Split out of `download` so these
/// checks are unit-testable without a real HTTP round trip.
fn check_response_is_acceptable(content_type: &str, declared_length: Option<u64>) -> Result<(), String> {
    if !content_type.starts_with("image/") {
        return Err("non_image_content_type".to_string());
    }
    if let Some(declared_length) = declared_length {
        if declared_length > MAX_DOWNLOAD_BYTES {
            return Err("oversized_content_length".to_string());
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionOutcome {
    Embedded,
    NoFace,
    Failed,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestionSummary {
    pub embedded: u64,
    pub no_face: u64,
    pub failed: u64,
}

pub struct IngestionStage {
    http: Client,
    face_detection: Arc<dyn FaceDetectionProvider>,
    images: DiscoveredImageRepository,
}

impl IngestionStage {
    pub fn new(
        http: Client,
        face_detection: Arc<dyn FaceDetectionProvider>,
        images: DiscoveredImageRepository,
    ) -> Self {
        Self { http, face_detection, images }
    }

    #[instrument(skip(self))]
    pub async fn run(&self, batch_limit: i64) -> IngestionSummary {
        let pending = match self.images.pending(batch_limit).await {
            Ok(images) => images,
            Err(error) => {
                warn!(%error, "failed to fetch pending images for ingestion");
                return IngestionSummary::default();
            }
        };

        let mut summary = IngestionSummary::default();
        for image in pending {
            match self.ingest_one(&image).await {
                IngestionOutcome::Embedded => summary.embedded += 1,
                IngestionOutcome::NoFace => summary.no_face += 1,
                IngestionOutcome::Failed => summary.failed += 1,
            }
        }
        summary
    }

    #[instrument(skip(self, image), fields(image_id = %image.id))]
    async fn ingest_one(&self, image: &DiscoveredImage) -> IngestionOutcome {
        let bytes = match self.download(&image.source_url).await {
            Ok(bytes) => bytes,
            Err(reason) => {
                self.fail(image.id, &reason).await;
                return IngestionOutcome::Failed;
            }
        };

        let face_detection = self.face_detection.clone();
        let detection = tokio::task::spawn_blocking(move || face_detection.detect(&bytes)).await;

        let faces = match detection {
            Ok(Ok(faces)) => faces,
            Ok(Err(error)) => {
                self.fail(image.id, &format!("detection_failed: {}", error)).await;
                return IngestionOutcome::Failed;
            }
            Err(_join_error) => {
                self.fail(image.id, "detection_task_panicked").await;
                return IngestionOutcome::Failed;
            }
        };

        match faces.len() {
            0 => {
                self.set_status(image.id, ImageStatus::NoFace, None).await;
                IngestionOutcome::NoFace
            }
            1 => {
                let face = &faces[0];
                if let Err(error) = self
                    .images
                    .insert_face_embedding(image.id, &face.embedding, face.detection_score)
                    .await
                {
                    warn!(%error, "failed to persist face embedding");
                    self.fail(image.id, "embedding_persist_failed").await;
                    return IngestionOutcome::Failed;
                }
                self.set_status(image.id, ImageStatus::Embedded, None).await;
                IngestionOutcome::Embedded
            }
            _ => {
                // Policy: only single-subject frames feed the matcher.
                self.set_status(image.id, ImageStatus::NoFace, Some("multiple_faces")).await;
                IngestionOutcome::NoFace
            }
        }
    }

    async fn download(&self, source_url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .http
            .get(source_url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| format!("download_error: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("download_status_{}", response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        check_response_is_acceptable(&content_type, response.content_length())?;

        let temp_file = NamedTempFile::new().map_err(|e| format!("tempfile_error: {}", e))?;
        let path = temp_file.path().to_path_buf();
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| format!("tempfile_open_error: {}", e))?;

        let mut stream = response.bytes_stream();
        let mut total_bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| format!("stream_error: {}", e))?;
            total_bytes += chunk.len() as u64;
            if total_bytes > MAX_DOWNLOAD_BYTES {
                return Err("oversized_stream".to_string());
            }
            file.write_all(&chunk).await.map_err(|e| format!("tempfile_write_error: {}", e))?;
        }
        file.flush().await.map_err(|e| format!("tempfile_flush_error: {}", e))?;
        drop(file);

        let contents = tokio::fs::read(&path).await.map_err(|e| format!("tempfile_read_error: {}", e))?;
        // `temp_file` is dropped here, deleting the backing file immediately
        // rather than waiting for the scheduled cleanup sweep.
        Ok(contents)
    }

    async fn fail(&self, image_id: uuid::Uuid, reason: &str) {
        if let Err(error) = self.images.set_status(image_id, ImageStatus::Failed, Some(reason)).await {
            warn!(%error, reason, "failed to record ingestion failure status");
        }
    }

    async fn set_status(&self, image_id: uuid::Uuid, status: ImageStatus, reason: Option<&str>) {
        if let Err(error) = self.images.set_status(image_id, status, reason).await {
            warn!(%error, "failed to update image status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core_providers::{BoundingBox, DetectedFace, ProviderError};
    use sentinel_infra_db::TursoClient;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn rejects_non_image_content_type() {
        assert_eq!(
            check_response_is_acceptable("text/html", Some(10)),
            Err("non_image_content_type".to_string())
        );
    }

    #[test]
    fn rejects_declared_length_over_the_cap() {
        assert_eq!(
            check_response_is_acceptable("image/png", Some(MAX_DOWNLOAD_BYTES + 1)),
            Err("oversized_content_length".to_string())
        );
    }

    #[test]
    fn accepts_an_image_under_the_cap() {
        assert_eq!(check_response_is_acceptable("image/jpeg", Some(1024)), Ok(()));
    }

    #[test]
    fn accepts_a_missing_content_length() {
        assert_eq!(check_response_is_acceptable("image/jpeg", None), Ok(()));
    }

    struct FixedFaceCountProvider {
        faces: usize,
    }

    impl FaceDetectionProvider for FixedFaceCountProvider {
        fn init_model(&self, _model_name: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        fn detect(&self, _image_bytes: &[u8]) -> Result<Vec<DetectedFace>, ProviderError> {
            Ok((0..self.faces)
                .map(|_| DetectedFace {
                    bbox: BoundingBox { x: 0.0, y: 0.0, width: 1.0, height: 1.0 },
                    detection_score: 0.9,
                    embedding: vec![1.0; 512],
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "fixed-count-stub"
        }
    }

    /// Serves one raw HTTP/1.1 response to a single connection, then exits.
    /// Stands in for a real image host without pulling in a mock-HTTP crate.
    async fn serve_one_image_response(body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/photo.png", addr)
    }

    async fn stage_with(faces: usize) -> (IngestionStage, DiscoveredImageRepository) {
        let client = TursoClient::connect(":memory:", None).await.unwrap();
        let images = DiscoveredImageRepository::new(client.get_connection().unwrap());
        let stage = IngestionStage::new(
            reqwest::Client::new(),
            Arc::new(FixedFaceCountProvider { faces }),
            DiscoveredImageRepository::new(client.get_connection().unwrap()),
        );
        (stage, images)
    }

    #[tokio::test]
    async fn single_face_image_is_embedded() {
        let (stage, images) = stage_with(1).await;
        let url = serve_one_image_response(b"not-really-a-png-but-bytes-are-all-that-matter").await;
        images.insert_pending(&url, None, None, None).await.unwrap();

        let summary = stage.run(10).await;
        assert_eq!(summary.embedded, 1);
        assert_eq!(summary.no_face, 0);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn zero_faces_is_recorded_as_no_face() {
        let (stage, images) = stage_with(0).await;
        let url = serve_one_image_response(b"blank").await;
        images.insert_pending(&url, None, None, None).await.unwrap();

        let summary = stage.run(10).await;
        assert_eq!(summary.no_face, 1);
        assert_eq!(summary.embedded, 0);
    }

    #[tokio::test]
    async fn multiple_faces_is_also_recorded_as_no_face() {
        let (stage, images) = stage_with(3).await;
        let url = serve_one_image_response(b"crowd").await;
        images.insert_pending(&url, None, None, None).await.unwrap();

        let summary = stage.run(10).await;
        assert_eq!(summary.no_face, 1);
        assert_eq!(summary.embedded, 0);
    }
}
