//! Course entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    /// Sub-group codes (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub sub_groups: Json,

    /// Accent color used by the dashboard
    pub theme: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Decode the sub-group code list.
    #[must_use]
    pub fn sub_group_codes(&self) -> Vec<String> {
        match &self.sub_groups {
            Json::Array(values) => values
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `code` names one of this course's sub-groups.
    #[must_use]
    pub fn has_sub_group(&self, code: &str) -> bool {
        self.sub_group_codes().iter().any(|c| c == code)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::content_item::Entity")]
    ContentItems,
}

impl Related<super::content_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
