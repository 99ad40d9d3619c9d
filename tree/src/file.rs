use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Reads an entire file into memory, for handing to [`crate::store_data`].
pub async fn read_file(path: impl AsRef<Path>) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path.as_ref()).await?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents).await?;
    Ok(contents)
}

/// Writes `data` to a freshly created file, overwriting whatever was
/// there, for the output of [`crate::find_data`].
pub async fn write_file(path: impl AsRef<Path>, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path.as_ref()).await?;
    file.write_all(data).await?;
    Ok(())
}
