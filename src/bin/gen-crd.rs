use kserving::crd::v1alpha1::Configuration as ConfigurationV1alpha1;
use kserving::crd::v1beta1::Configuration as ConfigurationV1beta1;
use kube::CustomResourceExt;
use serde_json::{json, Value};

fn main() -> anyhow::Result<()> {
    // Generate CRD with both versions served
    // Use: cargo run --bin gen-crd | python3 -c "import sys,json,yaml; print(yaml.dump(json.load(sys.stdin), default_flow_style=False))"
    // to convert to YAML

    // Base CRD from v1alpha1 (storage version)
    let mut crd: Value = serde_json::to_value(ConfigurationV1alpha1::crd())?;

    let v1beta1_crd: Value = serde_json::to_value(ConfigurationV1beta1::crd())?;
    let v1beta1_version = v1beta1_crd["spec"]["versions"][0].clone();

    // v1alpha1 stays the storage version until objects are upgraded via defaulting
    if let Some(versions) = crd["spec"]["versions"].as_array_mut() {
        if let Some(v1alpha1) = versions.get_mut(0) {
            v1alpha1["storage"] = json!(true);
            v1alpha1["served"] = json!(true);
        }
        let mut v1beta1 = v1beta1_version;
        v1beta1["storage"] = json!(false);
        v1beta1["served"] = json!(true);
        versions.push(v1beta1);
    }

    let json_output = serde_json::to_string_pretty(&crd)?;
    println!("{}", json_output);
    Ok(())
}
