use futures::future::try_join_all;

use crate::{engine::AsyncMdArrayIoTraits, strided_buffer::StridedBuffer};

use super::{md_array_read::MdArrayRead, ArrayError, MdArrayOptions};

/// Async strided buffer reads for multidimensional arrays.
///
/// Validation failures are returned by the future rather than when it is created.
#[async_trait::async_trait]
pub trait AsyncMdArrayReadExt: AsyncMdArrayIoTraits {
    /// Async variant of [`read_array`](crate::adapter::MdArrayReadExt::read_array).
    ///
    /// If `options` has no span, the dimension sizes are queried concurrently.
    #[allow(clippy::missing_errors_doc)]
    async fn async_read_array(&self, options: MdArrayOptions)
        -> Result<StridedBuffer, ArrayError>;
}

#[async_trait::async_trait]
impl<T: ?Sized + AsyncMdArrayIoTraits> AsyncMdArrayReadExt for T {
    async fn async_read_array(
        &self,
        options: MdArrayOptions,
    ) -> Result<StridedBuffer, ArrayError> {
        let dimensionality = self.dimension_count().await?;
        let span = if let Some(span) = options.span() {
            span.to_vec()
        } else {
            try_join_all((0..dimensionality).map(|index| self.dimension_size(index))).await?
        };
        let mut read = MdArrayRead::new(self.data_type(), dimensionality, options, span)?;
        let (descriptor, buffer) = read.split();
        self.read(&descriptor, buffer).await?;
        Ok(read.into_data())
    }
}
