use anyhow::Result;
use diesel::prelude::*;
use illu_core::ports::IllustrationRecordPort;
use illu_core::RecordId;

use crate::db::models::{NewAspectRow, NewIllustrationRow};
use crate::db::ports::DbExecutor;
use crate::db::schema::{t_illustration, t_illustration_aspect};

/// File names of one record collection, one row per (record, attribute),
/// plus the per-record aspect ratios kept alongside them.
///
/// A blank attribute or aspect field has no row.
pub struct DieselIllustrationRepository<E>
where
    E: DbExecutor,
{
    executor: E,
    collection: String,
}

impl<E> DieselIllustrationRepository<E>
where
    E: DbExecutor,
{
    pub fn new(executor: E, collection: impl Into<String>) -> Self {
        Self {
            executor,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl<E> IllustrationRecordPort for DieselIllustrationRepository<E>
where
    E: DbExecutor,
{
    fn current_file_name(&self, record: &RecordId, attribute: &str) -> Result<Option<String>> {
        self.executor.run(|conn| {
            let name = t_illustration::table
                .filter(t_illustration::collection.eq(&self.collection))
                .filter(t_illustration::record_id.eq(record.as_str()))
                .filter(t_illustration::attribute.eq(attribute))
                .select(t_illustration::file_name)
                .first::<String>(conn)
                .optional()
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;
            Ok(name.filter(|n| !n.is_empty()))
        })
    }

    fn set_file_name(
        &self,
        record: &RecordId,
        attribute: &str,
        file_name: Option<&str>,
    ) -> Result<()> {
        self.executor.run(|conn| {
            match file_name {
                Some(name) => {
                    let row = NewIllustrationRow {
                        collection: &self.collection,
                        record_id: record.as_str(),
                        attribute,
                        file_name: name,
                    };
                    diesel::replace_into(t_illustration::table)
                        .values(&row)
                        .execute(conn)?;
                }
                None => {
                    diesel::delete(
                        t_illustration::table
                            .filter(t_illustration::collection.eq(&self.collection))
                            .filter(t_illustration::record_id.eq(record.as_str()))
                            .filter(t_illustration::attribute.eq(attribute)),
                    )
                    .execute(conn)?;
                }
            }
            Ok(())
        })
    }

    fn exists_with_prefix(&self, attribute: &str, prefix: &str) -> Result<bool> {
        let pattern = like_prefix(prefix);
        self.executor.run(|conn| {
            let found = diesel::select(diesel::dsl::exists(
                t_illustration::table
                    .filter(t_illustration::collection.eq(&self.collection))
                    .filter(t_illustration::attribute.eq(attribute))
                    .filter(t_illustration::file_name.like(&pattern).escape('\\')),
            ))
            .get_result::<bool>(conn)?;
            Ok(found)
        })
    }

    fn current_aspect(&self, record: &RecordId, field: &str) -> Result<Option<f64>> {
        self.executor.run(|conn| {
            let aspect = t_illustration_aspect::table
                .filter(t_illustration_aspect::collection.eq(&self.collection))
                .filter(t_illustration_aspect::record_id.eq(record.as_str()))
                .filter(t_illustration_aspect::field.eq(field))
                .select(t_illustration_aspect::aspect)
                .first::<f64>(conn)
                .optional()?;
            Ok(aspect)
        })
    }

    fn set_aspect(&self, record: &RecordId, field: &str, aspect: Option<f64>) -> Result<()> {
        self.executor.run(|conn| {
            match aspect {
                Some(aspect) => {
                    let row = NewAspectRow {
                        collection: &self.collection,
                        record_id: record.as_str(),
                        field,
                        aspect,
                    };
                    diesel::replace_into(t_illustration_aspect::table)
                        .values(&row)
                        .execute(conn)?;
                }
                None => {
                    diesel::delete(
                        t_illustration_aspect::table
                            .filter(t_illustration_aspect::collection.eq(&self.collection))
                            .filter(t_illustration_aspect::record_id.eq(record.as_str()))
                            .filter(t_illustration_aspect::field.eq(field)),
                    )
                    .execute(conn)?;
                }
            }
            Ok(())
        })
    }
}
