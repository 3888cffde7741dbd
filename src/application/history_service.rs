// History service trait - batch access to stored telemetry
use crate::domain::query::RequestDescriptor;
use crate::domain::record::Record;
use async_trait::async_trait;

#[async_trait]
pub trait HistoryService: Send + Sync {
    /// Fetch the records matching a request, in the order the service sorted them
    async fn fetch(&self, query: &RequestDescriptor) -> anyhow::Result<Vec<Record>>;
}
