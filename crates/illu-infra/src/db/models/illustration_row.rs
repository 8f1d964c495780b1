use diesel::prelude::*;

use crate::db::schema::{t_illustration, t_illustration_aspect};

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = t_illustration)]
pub struct NewIllustrationRow<'a> {
    pub collection: &'a str,
    pub record_id: &'a str,
    pub attribute: &'a str,
    pub file_name: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = t_illustration_aspect)]
pub struct NewAspectRow<'a> {
    pub collection: &'a str,
    pub record_id: &'a str,
    pub field: &'a str,
    pub aspect: f64,
}
