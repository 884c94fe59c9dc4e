//! Router and UI artifact generation
//!
//! Both artifacts are pure functions of the spec set. Specs are rendered in
//! host label order and file maps are ordered, so equal inputs always produce
//! byte-identical artifacts.

use crate::{join_path, Artifact, Result, Spec};
use serde::{Deserialize, Serialize};

pub const ROUTER_CONFIGMAP_NAME: &str = "openapi-collector-router-config";
pub const UI_CONFIGMAP_NAME: &str = "openapi-collector-ui-config";
pub const UI_CONFIG_FILENAME: &str = "swagger-config.json";

/// Settings that shape the generated artifacts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Name of the router artifact
    pub router_artifact: String,
    /// Name of the UI artifact
    pub ui_artifact: String,
    /// Upstream that rewrites API documents
    pub proxy_upstream: String,
    /// Header carrying the true upstream authority to the proxy
    pub upstream_header: String,
    /// Filename of the API document under a spec's path
    pub document_filename: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            router_artifact: ROUTER_CONFIGMAP_NAME.to_string(),
            ui_artifact: UI_CONFIGMAP_NAME.to_string(),
            proxy_upstream: "proxy".to_string(),
            upstream_header: "ServerHost".to_string(),
            document_filename: "openapi.json".to_string(),
        }
    }
}

/// One entry of the documentation UI manifest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiUrl {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiManifest {
    pub urls: Vec<UiUrl>,
}

pub struct Generator {
    settings: GeneratorSettings,
}

impl Generator {
    /// Create a generator rendering with the given settings
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    /// Generate the router artifact followed by the UI artifact
    pub fn generate(&self, specs: &[Spec]) -> Result<Vec<Artifact>> {
        let specs = canonical_order(specs);
        Ok(vec![self.router_artifact(&specs), self.ui_artifact(&specs)?])
    }

    /// Path of the API document relative to the host label
    fn document_path(&self, spec: &Spec) -> String {
        join_path([spec.path.as_str(), self.settings.document_filename.as_str()])
    }

    fn router_artifact(&self, specs: &[&Spec]) -> Artifact {
        let mut artifact = Artifact::new(self.settings.router_artifact.clone());

        for spec in specs {
            let host = spec.host();
            artifact
                .data
                .insert(format!("{}-upstream.conf", host), upstream_fragment(&host, spec));
            artifact.data.insert(
                format!("{}-location.conf", host),
                self.location_fragment(&host, spec),
            );
        }

        artifact
    }

    fn location_fragment(&self, host: &str, spec: &Spec) -> String {
        format!(
            r#"
location = /{document} {{
  proxy_set_header {header} "http://{authority}";
  proxy_pass       http://{proxy};
}}

location /{host} {{
  rewrite          /{host}/(.*) /$1 break;
  proxy_pass       http://{host};
}}
"#,
            document = join_path([host, self.document_path(spec).as_str()]),
            header = self.settings.upstream_header,
            authority = spec.authority(),
            proxy = self.settings.proxy_upstream,
            host = host,
        )
    }

    fn ui_artifact(&self, specs: &[&Spec]) -> Result<Artifact> {
        let manifest = UiManifest {
            urls: specs
                .iter()
                .map(|spec| UiUrl {
                    name: spec.to_string(),
                    url: format!(
                        "/{}",
                        join_path([spec.host(), self.document_path(spec)])
                    ),
                })
                .collect(),
        };

        let mut artifact = Artifact::new(self.settings.ui_artifact.clone());
        artifact
            .data
            .insert(UI_CONFIG_FILENAME.to_string(), serde_json::to_string(&manifest)?);
        Ok(artifact)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GeneratorSettings::default())
    }
}

fn upstream_fragment(host: &str, spec: &Spec) -> String {
    format!(
        r#"
upstream {host} {{
  server {authority};
}}
"#,
        host = host,
        authority = spec.authority(),
    )
}

/// Sort by host label, then by namespace and name so ties stay stable
fn canonical_order(specs: &[Spec]) -> Vec<&Spec> {
    let mut ordered: Vec<&Spec> = specs.iter().collect();
    ordered.sort_by(|a, b| {
        a.host()
            .cmp(&b.host())
            .then_with(|| a.namespace.cmp(&b.namespace))
            .then_with(|| a.name.cmp(&b.name))
    });
    ordered
}
