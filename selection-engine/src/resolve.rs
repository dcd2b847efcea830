//! Resolution of the final selection for a command.
//!
//! A resolution starts from a base selection picked by the [`DisplayMode`], replaces it with the
//! caller's own selection text when there is one, merges the requested dot paths, and checks that
//! the result still selects something.
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::SelectionError;
use crate::parser::SelectionSource;
use crate::schema::RawSchema;
use crate::schema::SchemaIndex;
use crate::selection::ID;
use crate::selection::SelectionNode;
use crate::synthesize::Synthesizer;

/// How the base selection of a command is chosen.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum DisplayMode {
    /// Start from nothing. Only explicitly requested fields are selected.
    Raw,
    /// Start from a selection generated from the schema.
    All,
    /// Start from the command's hand-written selection.
    #[default]
    Default,
}

/// Everything a command knows about the selection it wants.
#[derive(Debug, Clone, Default)]
pub struct SelectionRequest {
    pub mode: DisplayMode,
    /// Root type for [`DisplayMode::All`]. Takes precedence over `resource`.
    pub root_type: Option<String>,
    /// Resource whose root type is looked up in [`EngineConfig::resources`].
    pub resource: Option<String>,
    /// The command's hand-written selection, used by [`DisplayMode::Default`].
    pub default_selection: Option<SelectionNode>,
    /// Selection text that replaces the base selection.
    pub selection_override: Option<SelectionSource>,
    /// Dot paths such as `variants.nodes.sku`, merged in order.
    pub field_paths: Vec<String>,
    /// Connections of the root type to follow in [`DisplayMode::All`].
    pub include_connections: Vec<String>,
    pub require_id: bool,
}

impl SelectionRequest {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }
}

/// Resolves selections against one schema.
///
/// The schema is shared, so a resolver is cheap to clone and resolutions may run on several
/// threads at once.
#[derive(Debug, Clone)]
pub struct SelectionResolver {
    schema: Arc<SchemaIndex>,
    config: EngineConfig,
}

impl SelectionResolver {
    /// Creates a resolver over an existing index.
    ///
    /// # Errors
    /// Returns [`SelectionError::ConnectionSuffixMismatch`] if the index detects connections with
    /// a different suffix than `config`.
    pub fn new(schema: Arc<SchemaIndex>, config: EngineConfig) -> Result<Self, SelectionError> {
        if schema.connection_suffix() != config.connection_suffix {
            return Err(SelectionError::ConnectionSuffixMismatch {
                schema: schema.connection_suffix().to_string(),
                config: config.connection_suffix,
            });
        }
        Ok(Self { schema, config })
    }

    /// Creates a resolver, indexing `raw` with the connection suffix of `config`.
    pub fn from_raw_schema(raw: RawSchema, config: EngineConfig) -> Self {
        let schema = SchemaIndex::with_connection_suffix(raw, config.connection_suffix.clone());
        Self {
            schema: Arc::new(schema),
            config,
        }
    }

    pub fn schema(&self) -> &SchemaIndex {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves the selection a command sends.
    ///
    /// # Errors
    /// Fails when the base selection cannot be built, when the selection text or a dot path is
    /// invalid, or when nothing ends up selected.
    pub fn resolve(&self, request: &SelectionRequest) -> Result<SelectionNode, SelectionError> {
        let base = match request.mode {
            DisplayMode::Raw => SelectionNode::new(),
            DisplayMode::All => self.synthesize_all(request)?,
            DisplayMode::Default => {
                match (&request.default_selection, &request.selection_override) {
                    (Some(default_selection), _) => default_selection.clone(),
                    // Replaced by the override below.
                    (None, Some(_)) => SelectionNode::new(),
                    (None, None) => return Err(SelectionError::MissingDefaultSelection),
                }
            }
        };

        let mut selection = match &request.selection_override {
            Some(source) => {
                tracing::debug!(mode = %request.mode, "replacing base selection");
                source.parse()?
            }
            None => base,
        };

        for path in &request.field_paths {
            tracing::debug!(path = %path, "merging field path");
            selection.merge_path(path, self.config.default_page_size)?;
        }

        if request.require_id && !selection.contains_field(ID) {
            selection = selection.with_leaf(ID);
        }

        if selection.is_empty() {
            return Err(match request.mode {
                DisplayMode::Raw => SelectionError::EmptyRawSelection,
                DisplayMode::All | DisplayMode::Default => SelectionError::EmptySelection,
            });
        }
        Ok(selection)
    }

    fn synthesize_all(&self, request: &SelectionRequest) -> Result<SelectionNode, SelectionError> {
        let root_type = self.root_type(request)?;
        self.validate_connections(root_type, &request.include_connections)?;
        tracing::debug!(
            root_type,
            include = ?request.include_connections,
            "synthesizing selection"
        );
        Synthesizer::from_config(&self.schema, &self.config)
            .synthesize(root_type, &request.include_connections)
    }

    fn root_type<'a>(&'a self, request: &'a SelectionRequest) -> Result<&'a str, SelectionError> {
        if let Some(root_type) = &request.root_type {
            return Ok(root_type.as_str());
        }
        let resource = request
            .resource
            .as_deref()
            .ok_or(SelectionError::MissingRootType)?;
        self.config
            .root_type_for(resource)
            .ok_or_else(|| SelectionError::UnknownResource(resource.to_string()))
    }

    /// Checks that every connection to include is a connection of `root_type` that can be
    /// selected without arguments.
    fn validate_connections(
        &self,
        root_type: &str,
        include: &[String],
    ) -> Result<(), SelectionError> {
        let descriptor = self
            .schema
            .type_descriptor(root_type)
            .ok_or_else(|| SelectionError::UnknownType(root_type.to_string()))?;
        for name in include {
            let field = descriptor
                .field(name)
                .ok_or_else(|| SelectionError::UnknownField {
                    type_name: root_type.to_string(),
                    field: name.clone(),
                })?;
            if !field.is_connection {
                return Err(SelectionError::NotAConnection {
                    type_name: root_type.to_string(),
                    field: name.clone(),
                });
            }
            if field.has_required_arguments {
                return Err(SelectionError::ConnectionRequiresArguments {
                    type_name: root_type.to_string(),
                    field: name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::schema::tests::product_schema;
    use crate::selection::SelectionValue;

    fn resolver() -> SelectionResolver {
        let config = EngineConfig::from_yaml_str("resources:\n  product: Product\n").unwrap();
        SelectionResolver::new(Arc::new(product_schema()), config).unwrap()
    }

    fn all(include: &[&str]) -> SelectionRequest {
        SelectionRequest {
            root_type: Some("Product".to_string()),
            include_connections: include.iter().map(ToString::to_string).collect(),
            ..SelectionRequest::new(DisplayMode::All)
        }
    }

    #[rstest]
    #[case("raw", DisplayMode::Raw)]
    #[case("all", DisplayMode::All)]
    #[case("default", DisplayMode::Default)]
    fn parses_display_mode(#[case] text: &str, #[case] mode: DisplayMode) {
        assert_eq!(DisplayMode::from_str(text).unwrap(), mode);
        assert_eq!(mode.to_string(), text);
    }

    #[test]
    fn raw_mode_without_fields_fails() {
        let error = resolver()
            .resolve(&SelectionRequest::new(DisplayMode::Raw))
            .unwrap_err();
        assert!(matches!(error, SelectionError::EmptyRawSelection));
        assert_eq!(
            error.to_string(),
            "Selection set is empty: raw mode requires an explicit selection or field paths"
        );
    }

    #[test]
    fn raw_mode_with_field_paths() {
        let request = SelectionRequest {
            field_paths: vec!["title".to_string(), "variants.nodes.sku".to_string()],
            require_id: true,
            ..SelectionRequest::new(DisplayMode::Raw)
        };
        let selection = resolver().resolve(&request).unwrap();
        assert_eq!(
            selection,
            SelectionNode::new()
                .with_leaf("title")
                .with_node(
                    "variants",
                    SelectionNode::new()
                        .with_argument("first", 25u32)
                        .with_node("nodes", SelectionNode::new().with_leaf("sku"))
                        .with_node("pageInfo", SelectionNode::page_info())
                )
                .with_leaf("id")
        );
    }

    #[test]
    fn all_mode_resolves_root_type_from_resource() {
        let request = SelectionRequest {
            resource: Some("product".to_string()),
            ..SelectionRequest::new(DisplayMode::All)
        };
        assert_eq!(
            resolver().resolve(&request).unwrap(),
            SelectionNode::all_scalars().with_node("seo", SelectionNode::all_scalars())
        );
    }

    #[test]
    fn all_mode_needs_a_root_type() {
        let error = resolver()
            .resolve(&SelectionRequest::new(DisplayMode::All))
            .unwrap_err();
        assert!(matches!(error, SelectionError::MissingRootType));

        let request = SelectionRequest {
            resource: Some("order".to_string()),
            ..SelectionRequest::new(DisplayMode::All)
        };
        let error = resolver().resolve(&request).unwrap_err();
        assert_eq!(error.to_string(), "Unknown resource `order`");

        let request = SelectionRequest {
            root_type: Some("Order".to_string()),
            ..SelectionRequest::new(DisplayMode::All)
        };
        let error = resolver().resolve(&request).unwrap_err();
        assert_eq!(error.to_string(), "Unknown type `Order`");
    }

    #[test]
    fn all_mode_includes_connections() {
        let selection = resolver().resolve(&all(&["variants"])).unwrap();
        let variants = selection
            .field("variants")
            .and_then(SelectionValue::as_node)
            .unwrap();
        assert_eq!(variants.argument("first"), Some(&25u32.into()));
        assert!(variants.contains_field("nodes"));
        assert!(variants.contains_field("pageInfo"));
    }

    #[test]
    fn rejects_invalid_connections() {
        let error = resolver().resolve(&all(&["reviews"])).unwrap_err();
        assert_eq!(error.to_string(), "Type `Product` has no field `reviews`");

        let error = resolver().resolve(&all(&["seo"])).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Field `Product.seo` is not a connection and cannot be included"
        );

        let schema = SchemaIndex::from_json(
            r#"{
                "Customer": {
                    "scalars": ["id"],
                    "fields": {
                        "id": { "type": "ID!" },
                        "orders": { "type": "OrderConnection!", "args": { "query": "String!" } }
                    }
                },
                "OrderConnection": { "fields": { "nodes": { "type": "[Order!]!" } } },
                "Order": { "scalars": ["id"], "fields": { "id": { "type": "ID!" } } }
            }"#,
        )
        .unwrap();
        let resolver = SelectionResolver::new(Arc::new(schema), EngineConfig::default()).unwrap();
        let request = SelectionRequest {
            root_type: Some("Customer".to_string()),
            include_connections: vec!["orders".to_string()],
            ..SelectionRequest::new(DisplayMode::All)
        };
        assert!(matches!(
            resolver.resolve(&request),
            Err(SelectionError::ConnectionRequiresArguments { .. })
        ));
    }

    #[test]
    fn default_mode_copies_the_default_selection() {
        let default_selection = SelectionNode::new().with_leaf("id").with_leaf("title");
        let request = SelectionRequest {
            default_selection: Some(default_selection.clone()),
            field_paths: vec!["seo.title".to_string()],
            ..SelectionRequest::default()
        };
        let selection = resolver().resolve(&request).unwrap();
        assert_eq!(
            selection,
            default_selection
                .clone()
                .with_node("seo", SelectionNode::new().with_leaf("title"))
        );
        assert_eq!(
            request.default_selection,
            Some(SelectionNode::new().with_leaf("id").with_leaf("title"))
        );

        let error = resolver()
            .resolve(&SelectionRequest::default())
            .unwrap_err();
        assert!(matches!(error, SelectionError::MissingDefaultSelection));
    }

    #[test]
    fn override_replaces_the_base() {
        let request = SelectionRequest {
            selection_override: Some(SelectionSource::parse_arg("handle seo { title }")),
            field_paths: vec!["seo.description".to_string()],
            ..all(&["variants"])
        };
        assert_eq!(
            resolver().resolve(&request).unwrap(),
            SelectionNode::new().with_leaf("handle").with_node(
                "seo",
                SelectionNode::new()
                    .with_leaf("title")
                    .with_leaf("description")
            )
        );
    }

    #[test]
    fn override_errors_are_reported() {
        let request = SelectionRequest {
            selection_override: Some(SelectionSource::parse_arg("{ id")),
            ..SelectionRequest::new(DisplayMode::Raw)
        };
        assert!(matches!(
            resolver().resolve(&request),
            Err(SelectionError::Grammar(_))
        ));
    }

    #[test]
    fn id_is_added_once() {
        let request = SelectionRequest {
            default_selection: Some(SelectionNode::new().with_leaf("title").with_leaf("id")),
            require_id: true,
            ..SelectionRequest::default()
        };
        let selection = resolver().resolve(&request).unwrap();
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn empty_default_selection_fails() {
        let request = SelectionRequest {
            default_selection: Some(SelectionNode::new().with_argument("first", 10u32)),
            ..SelectionRequest::default()
        };
        let error = resolver().resolve(&request).unwrap_err();
        assert!(matches!(error, SelectionError::EmptySelection));
        assert_eq!(error.to_string(), "Selection set is empty");
    }

    #[test]
    fn field_path_cannot_descend_into_leaf() {
        let request = SelectionRequest {
            selection_override: Some(SelectionSource::parse_arg("seo")),
            field_paths: vec!["seo.title".to_string()],
            ..SelectionRequest::new(DisplayMode::Raw)
        };
        assert!(matches!(
            resolver().resolve(&request),
            Err(SelectionError::DescendIntoLeaf { .. })
        ));
    }

    #[test]
    fn default_mode_override_needs_no_default() {
        let request = SelectionRequest {
            selection_override: Some(SelectionSource::parse_arg("handle")),
            ..SelectionRequest::default()
        };
        assert_eq!(
            resolver().resolve(&request).unwrap(),
            SelectionNode::new().with_leaf("handle")
        );
    }

    #[test]
    fn connection_suffix_must_match_the_index() {
        let config = EngineConfig::from_yaml_str("connection_suffix: Page").unwrap();
        let error = SelectionResolver::new(Arc::new(product_schema()), config).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Schema index treats `*Connection` types as connections, but the configuration uses `*Page`"
        );
    }

    #[test]
    fn raw_schema_is_indexed_with_configured_suffix() {
        let raw: RawSchema = serde_json::from_str(
            r#"{
                "Shop": { "fields": { "orders": { "type": "OrderPage" } } },
                "OrderPage": { "fields": { "nodes": { "type": "[Order]" } } },
                "Order": { "scalars": ["id"], "fields": { "id": { "type": "ID!" } } }
            }"#,
        )
        .unwrap();
        let config = EngineConfig::from_yaml_str("connection_suffix: Page").unwrap();
        let resolver = SelectionResolver::from_raw_schema(raw, config);
        assert_eq!(resolver.schema().connection_suffix(), "Page");
        let request = SelectionRequest {
            root_type: Some("Shop".to_string()),
            include_connections: vec!["orders".to_string()],
            ..SelectionRequest::new(DisplayMode::All)
        };
        assert_eq!(
            resolver.resolve(&request).unwrap(),
            SelectionNode::new().with_node(
                "orders",
                SelectionNode::new()
                    .with_argument("first", 25u32)
                    .with_node("nodes", SelectionNode::all_scalars())
                    .with_node("pageInfo", SelectionNode::page_info())
            )
        );
    }
}
