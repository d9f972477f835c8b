//! Export client registration operations.

use async_trait::async_trait;
use tracing::info;

use verdin_core::models::ExportRegistration;
use verdin_core::ObjectId;

use crate::client::Client;
use crate::error::Result;
use crate::mutation::{add_doc, delete_doc, exec_guarded, remove_ops, update_doc};
use crate::provider::ExportStore;
use crate::query;
use crate::schema;

#[async_trait]
impl ExportStore for Client {
    async fn registrations(&self) -> Result<Vec<ExportRegistration>> {
        let mut s = self.session().await?;
        query::all::<ExportRegistration>(&mut *s)
    }

    async fn add_registration(&self, registration: ExportRegistration) -> Result<String> {
        let mut s = self.session().await?;
        let registration = add_doc(&mut *s, registration)?;
        Ok(registration.id)
    }

    async fn update_registration(&self, registration: ExportRegistration) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, registration).map(|_| ())
    }

    async fn registration_by_id(&self, id: &str) -> Result<ExportRegistration> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn registration_by_name(&self, name: &str) -> Result<ExportRegistration> {
        let mut s = self.session().await?;
        query::get_by_name(&mut *s, name)
    }

    async fn delete_registration_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<ExportRegistration>(&mut *s, id).map(|_| ())
    }

    async fn delete_registration_by_name(&self, name: &str) -> Result<()> {
        let mut s = self.session().await?;
        let registration: ExportRegistration = query::get_by_name(&mut *s, name)?;
        exec_guarded(&mut *s, remove_ops(&registration))
    }

    async fn scrub_all_registrations(&self) -> Result<()> {
        let mut s = self.session().await?;
        super::scrub_collection(&mut *s, schema::EXPORT_REGISTRATIONS)?;
        info!("scrubbed export registrations");
        Ok(())
    }
}
