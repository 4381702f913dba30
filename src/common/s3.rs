//! Helper code for working with S3.

use std::path::Path;

use tokio::io::AsyncWriteExt;

/// Helper that returns whether S3 mode has been enabled via `AWS_ACCESS_KEY_ID`.
pub fn s3_mode() -> bool {
    std::env::var("AWS_ACCESS_KEY_ID").is_ok()
}

/// Return the S3 configuration from environment variables.
///
/// `AWS_ENDPOINT_URL` is optional; when set, path style addressing is used
/// so that S3-compatible stores such as MinIO work.
pub async fn config_from_env() -> aws_sdk_s3::config::Config {
    let config = aws_config::from_env().load().await;
    match std::env::var("AWS_ENDPOINT_URL") {
        Ok(endpoint_url) => {
            tracing::trace!("will use endpoint url {:?}", &endpoint_url);
            aws_sdk_s3::config::Builder::from(&config)
                .endpoint_url(endpoint_url)
                .force_path_style(true)
                .build()
        }
        Err(_) => aws_sdk_s3::config::Builder::from(&config).build(),
    }
}

/// Download `bucket`/`key` into the local file at `dst`.
pub async fn download_file(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    dst: &Path,
) -> Result<(), anyhow::Error> {
    tracing::debug!("will download bucket {:?} and key {:?}", bucket, key);

    let mut object = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("could not get s3://{}/{}: {}", bucket, key, e))?;

    let mut file = tokio::fs::File::create(dst)
        .await
        .map_err(|e| anyhow::anyhow!("could not create file {:?}: {}", dst, e))?;
    while let Some(bytes) = object
        .body
        .try_next()
        .await
        .map_err(|e| anyhow::anyhow!("error reading s3://{}/{}: {}", bucket, key, e))?
    {
        file.write_all(&bytes).await?;
    }
    file.flush().await?;

    Ok(())
}

/// Upload the local file at `src` to `bucket`/`key`.
pub async fn upload_file(
    client: &aws_sdk_s3::Client,
    src: &Path,
    bucket: &str,
    key: &str,
) -> Result<(), anyhow::Error> {
    tracing::debug!("will upload to bucket {:?} and key {:?}", bucket, key);

    let body = aws_sdk_s3::primitives::ByteStream::from_path(src)
        .await
        .map_err(|e| anyhow::anyhow!("could not open file {:?}: {}", src, e))?;
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("could not upload file {:?}: {}", src, e))?;

    Ok(())
}
