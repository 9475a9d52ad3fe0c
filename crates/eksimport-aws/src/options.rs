//! Tunables of the resolution rules

use serde::{Deserialize, Serialize};

use eksimport_common::LATEST_TEMPLATE_VERSION;

/// Options shared by the resolvers
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverOptions {
    /// Version queried when a mixed-instances launch template has none.
    ///
    /// Defaults to `$Latest`. Some deployments expect `$Default` here.
    pub default_template_version: String,

    /// Report spot nodegroups as `onDemand`.
    ///
    /// Enabled by default to keep the output stable for existing consumers.
    pub collapse_spot_capacity: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            default_template_version: LATEST_TEMPLATE_VERSION.to_string(),
            collapse_spot_capacity: true,
        }
    }
}
