#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::config::Defaults;
use k8s_openapi::api::core::v1::VolumeMount;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use serde_json::json;

fn parse_alpha(yaml: &str) -> v1alpha1::Configuration {
    serde_yaml::from_str(yaml).expect("Failed to deserialize Configuration")
}

fn alpha_with_spec(spec: v1alpha1::ConfigurationSpec) -> v1alpha1::Configuration {
    let mut config = v1alpha1::Configuration::new("hello", spec);
    config.metadata.namespace = Some("demo".to_string());
    config
}

fn named_template_defaults() -> Defaults {
    Defaults {
        user_container_name_template: "{{.Name}}-{{.Namespace}}".to_string(),
        ..Defaults::default()
    }
}

const DEPRECATED_YAML: &str = r#"
apiVersion: serving.knative.dev/v1alpha1
kind: Configuration
metadata:
  name: hello
  namespace: demo
spec:
  generation: 4
  revisionTemplate:
    metadata:
      labels:
        app: hello
    spec:
      concurrencyModel: Single
      container:
        name: ""
        image: gcr.io/example/hello:latest
        volumeMounts:
        - name: config
          mountPath: /etc/config
"#;

#[test]
fn test_deprecated_configuration_deserializes() {
    let config = parse_alpha(DEPRECATED_YAML);

    assert_eq!(config.spec.deprecated_generation, Some(4));
    let template = config.spec.template().expect("template should exist");
    assert_eq!(
        template.spec.deprecated_concurrency_model,
        Some(v1alpha1::ConcurrencyModel::Single)
    );
    assert!(template.spec.deprecated_container.is_some());
    assert!(config.spec.template.is_none());
}

#[test]
fn test_defaults_without_upgrade_keep_deprecated_shape() {
    let mut config = parse_alpha(DEPRECATED_YAML);

    config.set_defaults(&DefaultingContext::default());

    assert_eq!(config.spec.deprecated_generation, Some(4));
    assert!(config.spec.template.is_none());
    let revision = &config.spec.deprecated_revision_template.as_ref().unwrap().spec;
    assert_eq!(revision.container_concurrency, Some(1));
    assert_eq!(revision.timeout_seconds, Some(300));

    let container = revision.deprecated_container.as_ref().unwrap();
    assert_eq!(container.name, "user-container");
    let mounts = container.volume_mounts.as_ref().unwrap();
    assert_eq!(mounts[0].read_only, Some(true));
}

#[test]
fn test_defaults_with_upgrade_normalize_then_default() {
    let mut config = parse_alpha(DEPRECATED_YAML);

    config.set_defaults(&DefaultingContext::default().with_upgrade_via_defaulting());

    assert!(config.spec.deprecated_generation.is_none());
    assert!(config.spec.deprecated_revision_template.is_none());
    let template = config.spec.template.as_ref().expect("template should exist");
    assert_eq!(
        template.metadata.labels.as_ref().unwrap().get("app").map(String::as_str),
        Some("hello")
    );

    let revision = &template.spec;
    assert!(revision.deprecated_container.is_none());
    assert!(revision.deprecated_concurrency_model.is_none());
    assert_eq!(revision.container_concurrency, Some(1));
    assert_eq!(revision.timeout_seconds, Some(300));
    assert_eq!(revision.containers.len(), 1);
    assert_eq!(revision.containers[0].name, "user-container");
    assert_eq!(
        revision.containers[0].image.as_deref(),
        Some("gcr.io/example/hello:latest")
    );
}

#[test]
fn test_failed_upgrade_still_runs_template_defaults() {
    let mut config = parse_alpha(DEPRECATED_YAML);
    config.spec.deprecated_build = Some(RawExtension(json!({"serviceAccountName": "builder"})));

    config.set_defaults(&DefaultingContext::default().with_upgrade_via_defaulting());

    // build blocks conversion, so the deprecated shape survives
    assert!(config.spec.deprecated_build.is_some());
    assert_eq!(config.spec.deprecated_generation, Some(4));
    let revision = &config.spec.deprecated_revision_template.as_ref().unwrap().spec;
    assert!(revision.deprecated_container.is_none());
    assert_eq!(revision.containers[0].name, "user-container");
}

#[test]
fn test_spec_without_template_is_left_alone() {
    let mut config = alpha_with_spec(v1alpha1::ConfigurationSpec::default());

    config.set_defaults(&DefaultingContext::default().with_upgrade_via_defaulting());

    assert_eq!(config.spec, v1alpha1::ConfigurationSpec::default());
}

#[test]
fn test_defaulting_is_idempotent() {
    let contexts = [
        DefaultingContext::default(),
        DefaultingContext::default().with_upgrade_via_defaulting(),
        DefaultingContext::new(Defaults {
            revision_cpu_request: Some(Quantity("250m".to_string())),
            revision_memory_limit: Some(Quantity("512Mi".to_string())),
            ..named_template_defaults()
        }),
    ];

    for ctx in contexts {
        let mut once = parse_alpha(DEPRECATED_YAML);
        once.set_defaults(&ctx);

        let mut twice = once.clone();
        twice.set_defaults(&ctx);

        assert_eq!(once, twice);
    }
}

#[test]
fn test_spec_context_carries_parent_and_spec() {
    let config = parse_alpha(DEPRECATED_YAML);

    let ctx = config.spec_context(&DefaultingContext::default());

    assert!(ctx.is_in_spec());
    let parent = ctx.parent_meta().expect("parent should be set");
    assert_eq!(parent.name.as_deref(), Some("hello"));
    assert_eq!(parent.namespace.as_deref(), Some("demo"));
}

#[test]
fn test_parent_reaches_container_defaulting() {
    let mut config = alpha_with_spec(v1alpha1::ConfigurationSpec {
        template: Some(v1alpha1::RevisionTemplateSpec {
            metadata: ObjectMeta::default(),
            spec: v1alpha1::RevisionSpec {
                containers: vec![Container {
                    image: Some("nginx".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
        }),
        ..Default::default()
    });

    config.set_defaults(&DefaultingContext::new(named_template_defaults()));

    let revision = &config.spec.template.as_ref().unwrap().spec;
    assert_eq!(revision.containers[0].name, "hello-demo");
}

#[test]
fn test_explicit_values_are_kept() {
    let mut spec = v1alpha1::RevisionSpec {
        containers: vec![Container {
            name: "web".to_string(),
            ..Default::default()
        }],
        container_concurrency: Some(25),
        timeout_seconds: Some(45),
        ..Default::default()
    };

    spec.set_defaults(&DefaultingContext::default());

    assert_eq!(spec.container_concurrency, Some(25));
    assert_eq!(spec.timeout_seconds, Some(45));
    assert_eq!(spec.containers[0].name, "web");
}

#[test]
fn test_multi_concurrency_model_uses_configured_default() {
    let mut spec = v1alpha1::RevisionSpec {
        deprecated_concurrency_model: Some(v1alpha1::ConcurrencyModel::Multi),
        ..Default::default()
    };

    spec.set_defaults(&DefaultingContext::new(Defaults {
        container_concurrency: 50,
        ..Defaults::default()
    }));

    assert_eq!(spec.container_concurrency, Some(50));
}

#[test]
fn test_resource_defaults_fill_only_missing_entries() {
    let mut container = Container {
        name: "app".to_string(),
        resources: Some(ResourceRequirements {
            requests: Some([("cpu".to_string(), Quantity("1".to_string()))].into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let ctx = DefaultingContext::new(Defaults {
        revision_cpu_request: Some(Quantity("400m".to_string())),
        revision_memory_request: Some(Quantity("100M".to_string())),
        revision_cpu_limit: Some(Quantity("1000m".to_string())),
        ..Defaults::default()
    });

    default_container(&mut container, &ctx);

    let resources = container.resources.unwrap();
    let requests = resources.requests.unwrap();
    assert_eq!(requests.get("cpu"), Some(&Quantity("1".to_string())));
    assert_eq!(requests.get("memory"), Some(&Quantity("100M".to_string())));
    let limits = resources.limits.unwrap();
    assert_eq!(limits.get("cpu"), Some(&Quantity("1000m".to_string())));
    assert!(limits.get("memory").is_none());
}

#[test]
fn test_no_resource_defaults_leave_resources_unset() {
    let mut container = Container::default();

    default_container(&mut container, &DefaultingContext::default());

    assert!(container.resources.is_none());
}

#[test]
fn test_volume_mounts_become_read_only() {
    let mut container = Container {
        name: "app".to_string(),
        volume_mounts: Some(vec![
            VolumeMount {
                name: "a".to_string(),
                mount_path: "/a".to_string(),
                read_only: Some(false),
                ..Default::default()
            },
            VolumeMount {
                name: "b".to_string(),
                mount_path: "/b".to_string(),
                ..Default::default()
            },
        ]),
        ..Default::default()
    };

    default_container(&mut container, &DefaultingContext::default());

    for mount in container.volume_mounts.unwrap() {
        assert_eq!(mount.read_only, Some(true));
    }
}

// --- v1beta1 ---

#[test]
fn test_v1beta1_configuration_defaults() {
    let yaml = r#"
apiVersion: serving.knative.dev/v1beta1
kind: Configuration
metadata:
  name: hello
  namespace: demo
spec:
  template:
    spec:
      containers:
      - name: ""
        image: gcr.io/example/hello:latest
"#;
    let mut config: v1beta1::Configuration =
        serde_yaml::from_str(yaml).expect("Failed to deserialize Configuration");

    config.set_defaults(&DefaultingContext::new(named_template_defaults()));

    let revision = &config.spec.template.spec;
    assert_eq!(revision.containers[0].name, "hello-demo");
    assert_eq!(revision.timeout_seconds, Some(300));
    assert_eq!(revision.container_concurrency, Some(0));

    let again = {
        let mut copy = config.clone();
        copy.set_defaults(&DefaultingContext::new(named_template_defaults()));
        copy
    };
    assert_eq!(again, config);
}

#[test]
fn test_nameless_parent_falls_back_to_default_container_name() {
    let mut config = v1alpha1::Configuration::new(
        "",
        v1alpha1::ConfigurationSpec {
            template: Some(v1alpha1::RevisionTemplateSpec {
                metadata: ObjectMeta::default(),
                spec: v1alpha1::RevisionSpec {
                    containers: vec![Container::default()],
                    ..Default::default()
                },
            }),
            ..Default::default()
        },
    );
    config.metadata = ObjectMeta {
        generate_name: Some("hello-".to_string()),
        ..Default::default()
    };

    config.set_defaults(&DefaultingContext::new(Defaults {
        user_container_name_template: "{{.Name}}".to_string(),
        ..Defaults::default()
    }));

    let revision = &config.spec.template.as_ref().unwrap().spec;
    assert_eq!(revision.containers[0].name, "user-container");
}

#[test]
fn test_spec_defaults_use_the_given_context_for_the_template() {
    // The spec level adds nothing of its own: what the template sees is what
    // the Configuration derived.
    let mut config = alpha_with_spec(v1alpha1::ConfigurationSpec {
        template: Some(v1alpha1::RevisionTemplateSpec {
            metadata: ObjectMeta::default(),
            spec: v1alpha1::RevisionSpec {
                containers: vec![Container::default()],
                ..Default::default()
            },
        }),
        ..Default::default()
    });
    let root = DefaultingContext::new(named_template_defaults()).with_upgrade_via_defaulting();
    let ctx = config.spec_context(&root);

    assert_eq!(ctx.parent_meta(), Some(&config.metadata));
    assert!(ctx.is_in_spec());
    assert!(ctx.is_upgrade_via_defaulting());

    let mut via_spec = config.spec.clone();
    via_spec.set_defaults(&ctx);
    config.set_defaults(&root);

    assert_eq!(via_spec, config.spec);
    let revision = &via_spec.template.as_ref().unwrap().spec;
    assert_eq!(revision.containers[0].name, "hello-demo");
}

#[test]
fn test_spec_defaults_without_parent_use_fallback_name() {
    let mut spec = v1alpha1::ConfigurationSpec {
        template: Some(v1alpha1::RevisionTemplateSpec {
            metadata: ObjectMeta::default(),
            spec: v1alpha1::RevisionSpec {
                containers: vec![Container::default()],
                ..Default::default()
            },
        }),
        ..Default::default()
    };

    spec.set_defaults(&DefaultingContext::new(named_template_defaults()).within_spec());

    let revision = &spec.template.as_ref().unwrap().spec;
    assert_eq!(revision.containers[0].name, "user-container");
}
