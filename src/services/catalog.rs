use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;

use crate::entities::{category, employee, supplier};
use crate::errors::ServiceError;

/// Read-only access to the reference tables the forms pick from.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(&self) -> Result<Vec<supplier::Model>, ServiceError> {
        Ok(supplier::Entity::find()
            .order_by_asc(supplier::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_employees(&self) -> Result<Vec<employee::Model>, ServiceError> {
        Ok(employee::Entity::find()
            .order_by_asc(employee::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Exact-name lookup, as used by the product form's category picker.
    #[instrument(skip(self))]
    pub async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<category::Model>, ServiceError> {
        category_by_name(&*self.db, name.trim()).await
    }
}

async fn category_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<category::Model>, ServiceError> {
    Ok(category::Entity::find()
        .filter(category::Column::Name.eq(name))
        .one(conn)
        .await?)
}

/// Resolves an optional category name to its id; an unknown name is an error.
pub(crate) async fn resolve_category<C: ConnectionTrait>(
    conn: &C,
    name: Option<&str>,
) -> Result<Option<i32>, ServiceError> {
    let Some(name) = name else {
        return Ok(None);
    };
    category_by_name(conn, name)
        .await?
        .map(|c| Some(c.id))
        .ok_or_else(|| ServiceError::not_found(format!("Category '{}' not found", name)))
}

/// Resolves an optional supplier name to its id; an unknown name is an error.
pub(crate) async fn resolve_supplier<C: ConnectionTrait>(
    conn: &C,
    name: Option<&str>,
) -> Result<Option<i32>, ServiceError> {
    let Some(name) = name else {
        return Ok(None);
    };
    supplier::Entity::find()
        .filter(supplier::Column::Name.eq(name))
        .one(conn)
        .await?
        .map(|s| Some(s.id))
        .ok_or_else(|| ServiceError::not_found(format!("Supplier '{}' not found", name)))
}

/// First employee by id; stands in for the signed-in clerk.
pub(crate) async fn default_employee<C: ConnectionTrait>(
    conn: &C,
) -> Result<Option<employee::Model>, ServiceError> {
    Ok(employee::Entity::find()
        .order_by_asc(employee::Column::Id)
        .one(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ensure_schema, establish_connection};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn category_names_resolve_exactly() {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        ensure_schema(&db).await.unwrap();
        crate::seed::seed_if_empty(&db).await.unwrap();
        let catalog = CatalogService::new(Arc::new(db));

        let sandals = catalog.find_category_by_name(" Sandals ").await.unwrap().unwrap();
        assert_eq!(sandals.id, 5);
        assert!(catalog.find_category_by_name("sandal").await.unwrap().is_none());

        assert_eq!(
            resolve_category(&*catalog.db, Some("Sandals")).await.unwrap(),
            Some(5)
        );
        assert_eq!(resolve_category(&*catalog.db, None).await.unwrap(), None);
        assert_matches!(
            resolve_category(&*catalog.db, Some("Boots")).await,
            Err(ServiceError::NotFound(msg)) if msg == "Category 'Boots' not found"
        );

        assert_eq!(catalog.list_categories().await.unwrap().len(), 6);
        assert_eq!(
            default_employee(&*catalog.db).await.unwrap().map(|e| e.first_name),
            Some("Alice".to_string())
        );
    }
}
