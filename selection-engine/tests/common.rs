use std::path::Path;
use std::sync::Arc;

use selection_engine::EngineConfig;
use selection_engine::SchemaIndex;
use selection_engine::SelectionResolver;

pub(crate) fn shop_schema() -> SchemaIndex {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shop.yaml");
    SchemaIndex::from_path(&path, "Connection").unwrap()
}

pub(crate) fn shop_config() -> EngineConfig {
    EngineConfig::from_yaml_str(
        r#"
default_page_size: 50
resources:
  product: Product
  collection: Collection
"#,
    )
    .unwrap()
}

pub(crate) fn resolver() -> SelectionResolver {
    SelectionResolver::new(Arc::new(shop_schema()), shop_config()).unwrap()
}
