use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "1001",
        "name": "Student #1001",
        "avatar": "https://picsum.photos/seed/1001/400/400"
    })
)]
pub struct Student {
    #[schema(example = "1001")]
    pub id: String,

    #[schema(example = "Student #1001")]
    pub name: String,

    /// Image reference: a URL or a `data:image/...;base64,` URI.
    #[schema(example = "https://picsum.photos/seed/1001/400/400")]
    pub avatar: String,
}
