use sea_orm::entity::prelude::*;

/// Classification of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
pub enum DocumentCategory {
    #[sea_orm(string_value = "RESUME")]
    Resume,
    #[sea_orm(string_value = "PORTFOLIO")]
    Portfolio,
    #[sea_orm(string_value = "CERTIFICATE")]
    Certificate,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Resume => "RESUME",
            DocumentCategory::Portfolio => "PORTFOLIO",
            DocumentCategory::Certificate => "CERTIFICATE",
            DocumentCategory::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RESUME" => Some(DocumentCategory::Resume),
            "PORTFOLIO" => Some(DocumentCategory::Portfolio),
            "CERTIFICATE" => Some(DocumentCategory::Certificate),
            "OTHER" => Some(DocumentCategory::Other),
            _ => None,
        }
    }
}

/// A file uploaded by a user. `file_path` is the public path of the stored
/// copy; `file_name` is the name the user uploaded it under.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub category: DocumentCategory,
    pub description: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
