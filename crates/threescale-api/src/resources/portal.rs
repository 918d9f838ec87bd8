use serde::Deserialize;

typed_resource!(
    /// An OpenAPI document published on the developer portal.
    ActiveDoc => ActiveDoc, root
);

typed_resource!(
    /// Provider-wide webhook settings. Readable only by touching them with
    /// an empty `PATCH`.
    Webhook => Webhook, root
);

typed_resource!(
    /// Provider-wide developer portal settings.
    Settings => Settings, root
);

/// Typed view of an active doc.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveDocView {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub service_id: Option<u64>,
    #[serde(default)]
    pub body: Option<String>,
}
