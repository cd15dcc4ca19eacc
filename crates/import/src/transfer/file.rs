use crate::Context;
use crate::transfer::error::{ErrorKind, Result};
use exn::ResultExt;
use senas_asyncutils::with_retry;
use senas_catalog::{BatchId, LeafId, NewSample, Quality, Sample, SampleKind, SampleSource};
use std::path::{Path, PathBuf};

/// One remote image and where its local copy goes.
#[derive(Debug, Clone)]
pub(crate) struct FileTask {
    pub(crate) file_id: String,
    pub(crate) original_name: String,
    /// Destination relative to the dataset root.
    pub(crate) path: PathBuf,
    pub(crate) leaf: LeafId,
    pub(crate) batch: BatchId,
}

/// Download, validate, measure and record a single remote image.
///
/// The sample records the resolved location of the local copy. An invalid
/// image is deleted from the sink before the error is returned.
/// A failed sample write leaves the downloaded file where it is.
pub(crate) async fn transfer_file(ctx: &Context, task: &FileTask) -> Result<Sample> {
    let label = format!("download {}", task.original_name);
    with_retry(&ctx.retry, &label, move || async move {
        let data = ctx.remote.read(&task.file_id).await?;
        ctx.local.write(&task.path, &data).await
    })
    .await
    .or_raise(|| ErrorKind::Download)?;

    let absolute = ctx.local.resolve(&task.path).or_raise(|| ErrorKind::Storage)?;
    if !ctx.validator.is_valid_image(&absolute).await {
        ctx.local.delete(&task.path).await.or_raise(|| ErrorKind::Storage)?;
        exn::bail!(ErrorKind::InvalidImage(task.original_name.clone()));
    }

    let info = ctx.local.stat(&task.path).await.or_raise(|| ErrorKind::Storage)?;
    let dimensions = ctx.validator.dimensions(&absolute).await;
    let sample = NewSample {
        file_path: absolute.to_string_lossy().into_owned(),
        original_name: task.original_name.clone(),
        file_size: info.size,
        width: dimensions.width,
        height: dimensions.height,
        format: format_of(&task.original_name),
        kind: SampleKind::Image,
        quality: Quality::Pending,
        source: SampleSource::Batch,
        batch: task.batch,
        leaf: task.leaf,
    };
    ctx.catalog.create_sample(&sample).await.or_raise(|| ErrorKind::Catalog)
}

/// Lower-case extension of the remote file name.
fn format_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hand.PNG", "png")]
    #[case("mano.derecha.jpeg", "jpeg")]
    #[case("sin-extension", "")]
    fn test_format_of(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(format_of(name), expected);
    }
}
