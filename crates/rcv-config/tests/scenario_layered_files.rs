use std::io::Write;

use rcv_config::{
    load_layered_yaml, report_unused_keys, ReceivingConfig, UnusedKeyPolicy,
};

fn write_layer(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn file_layers_merge_into_typed_config() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_layer(
        &dir,
        "base.yaml",
        "service:\n  base_url: https://erp.example.test/odata\nreconcile:\n  business_rule_status_ceiling: 500\n",
    );
    let store = write_layer(
        &dir,
        "store-0012.yaml",
        "reconcile:\n  business_rule_status_ceiling: 450\nui:\n  secondary_load_delay_ms: 0\n",
    );

    let loaded = load_layered_yaml(&[base.as_str(), store.as_str()]).unwrap();
    let cfg = ReceivingConfig::from_loaded(&loaded).unwrap();
    assert_eq!(cfg.reconcile.business_rule_status_ceiling, 450);
    assert_eq!(cfg.ui.secondary_load_delay_ms, 0);
    assert_eq!(cfg.ui.toast_duration_ms, 1000, "defaults fill the gaps");
    assert_eq!(
        cfg.service.base_url.as_deref(),
        Some("https://erp.example.test/odata")
    );
}

#[test]
fn missing_layer_names_the_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"])
        .unwrap_err()
        .to_string();
    assert!(err.contains("/definitely/not/here.yaml"), "got: {err}");
}

#[test]
fn unused_keys_warn_or_fail() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_layer(&dir, "base.yaml", "ui:\n  toast_duration_ms: 800\nlegacy:\n  flag: true\n");
    let loaded = load_layered_yaml(&[path.as_str()]).unwrap();

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(report.unused_leaf_pointers, vec!["/legacy/flag".to_string()]);

    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"));
}
