//! Create, update and delete
//!
//! Every write goes to the store first, then clears the written identifier
//! from the context's loader, then reloads through the loader. Reads that
//! follow in the same context see the write.

use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::context::PentContext;
use crate::error::{PentError, PentResult, StoreError};
use crate::mutation::MutationData;
use crate::pent::{gen_pent_dynamic, Pent, PentObject};
use crate::registry::PentClass;

fn reloaded<T>(obj_id: Uuid, entity: Option<T>) -> PentResult<T> {
    entity.ok_or_else(|| {
        error!(%obj_id, "Object missing right after write");
        PentError::Store(StoreError::Query(format!(
            "object {} not found after write",
            obj_id
        )))
    })
}

/// Insert a new `T` and return it as loaded from the store.
#[instrument(skip(context, data), fields(type_name = T::TYPE_NAME))]
pub async fn create_pent<T: Pent>(context: &PentContext, data: &MutationData) -> PentResult<T> {
    let type_id = context.registry().type_id_for::<T>()?;
    let obj_id = context
        .store()
        .insert_object(type_id, data.to_sparse_map())
        .await?;
    debug!(%obj_id, "Created object");
    reloaded(obj_id, T::gen(context, obj_id).await?)
}

/// Write `data` over `obj_id` and return the reloaded entity.
#[instrument(skip(context, data), fields(type_name = T::TYPE_NAME))]
pub async fn update_pent<T: Pent>(
    context: &PentContext,
    obj_id: Uuid,
    data: &MutationData,
) -> PentResult<T> {
    context
        .store()
        .update_object(obj_id, data.to_sparse_map())
        .await?;
    context.loader().clear(obj_id);
    reloaded(obj_id, T::gen(context, obj_id).await?)
}

/// Delete `obj_id` and return the identifier the store reports deleted.
#[instrument(skip(context))]
pub async fn delete_pent(context: &PentContext, obj_id: Uuid) -> PentResult<Uuid> {
    let deleted = context.store().delete_object(obj_id).await?;
    context.loader().clear(obj_id);
    if deleted != obj_id {
        context.loader().clear(deleted);
    }
    debug!(%deleted, "Deleted object");
    Ok(deleted)
}

async fn create_object(
    context: &PentContext,
    class: PentClass,
    data: &MutationData,
) -> PentResult<PentObject> {
    let type_id = context.registry().type_id_of(class)?;
    let obj_id = context
        .store()
        .insert_object(type_id, data.to_sparse_map())
        .await?;
    debug!(%obj_id, class = %class, "Created object");
    let object = context.loader().load(obj_id).await?;
    reloaded(obj_id, object)?.expect_class(class)
}

/// [`create_pent`] with the class looked up by name.
#[instrument(skip(context, data))]
pub async fn create_pent_dynamic(
    context: &PentContext,
    class_name: &str,
    data: &MutationData,
) -> PentResult<PentObject> {
    let class = context.class_named(class_name)?;
    create_object(context, class, data).await
}

/// [`update_pent`] with the class looked up by name.
#[instrument(skip(context, data))]
pub async fn update_pent_dynamic(
    context: &PentContext,
    class_name: &str,
    obj_id: Uuid,
    data: &MutationData,
) -> PentResult<PentObject> {
    context.class_named(class_name)?;
    context
        .store()
        .update_object(obj_id, data.to_sparse_map())
        .await?;
    context.loader().clear(obj_id);
    reloaded(obj_id, gen_pent_dynamic(context, class_name, obj_id).await?)
}

/// [`delete_pent`], checking the class name is registered first.
#[instrument(skip(context))]
pub async fn delete_pent_dynamic(
    context: &PentContext,
    class_name: &str,
    obj_id: Uuid,
) -> PentResult<Uuid> {
    context.class_named(class_name)?;
    delete_pent(context, obj_id).await
}
