// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan catalog
//!
//! The catalog is built once from configuration and shared immutably. It maps
//! plan names to plan IDs, knows which plans are enabled, and resolves a
//! caller's request into the `ProvisioningParameters` stored on an operation.

use crate::operation::ProvisioningParameters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("unrecognized {0} plan name")]
    Unrecognized(String),
    #[error("plan {0} is not enabled")]
    NotEnabled(String),
    #[error("no plans enabled")]
    Empty,
}

const AZURE_REGIONS: &[&str] = &[
    "centralus",
    "eastus",
    "westus2",
    "northeurope",
    "uksouth",
    "japaneast",
    "southeastasia",
    "westeurope",
];

const GCP_REGIONS: &[&str] = &["europe-west4", "europe-west3", "us-east4", "asia-northeast1"];

const OPTIONAL_COMPONENTS: &[&str] = &["Kiali", "Tracing"];

/// A service plan offered by the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub regions: &'static [&'static str],
    pub default_region: &'static str,
    pub default_machine_type: &'static str,
    pub optional_components: &'static [&'static str],
}

impl Plan {
    pub fn offers_region(&self, region: &str) -> bool {
        self.regions.is_empty() || self.regions.contains(&region)
    }

    pub fn allows_component(&self, component: &str) -> bool {
        self.optional_components.contains(&component)
    }
}

/// Every plan the broker knows about, enabled or not
pub const KNOWN_PLANS: &[Plan] = &[
    Plan {
        id: "4deee563-e5ec-4731-b9b1-53b42d855f0c",
        name: "azure",
        regions: AZURE_REGIONS,
        default_region: "westeurope",
        default_machine_type: "Standard_D8_v3",
        optional_components: OPTIONAL_COMPONENTS,
    },
    Plan {
        id: "8cb22518-aa26-44c5-91a0-e669ec9bf443",
        name: "azure_lite",
        regions: AZURE_REGIONS,
        default_region: "westeurope",
        default_machine_type: "Standard_D4_v3",
        optional_components: OPTIONAL_COMPONENTS,
    },
    Plan {
        id: "7d55d31d-35ae-4438-bf13-6ffdfa107d9f",
        name: "azure_trial",
        regions: AZURE_REGIONS,
        default_region: "westeurope",
        default_machine_type: "Standard_D4_v3",
        optional_components: &[],
    },
    Plan {
        id: "ca6e5357-707f-4565-bbbd-b3ab732597c6",
        name: "gcp",
        regions: GCP_REGIONS,
        default_region: "europe-west4",
        default_machine_type: "n1-standard-4",
        optional_components: OPTIONAL_COMPONENTS,
    },
    Plan {
        id: "8cb2b0a3-4f0e-4b4b-a7d4-9b1f4c0c2d8e",
        name: "gcp_trial",
        regions: GCP_REGIONS,
        default_region: "europe-west4",
        default_machine_type: "n1-standard-4",
        optional_components: &[],
    },
];

fn known_plan(name: &str) -> Option<&'static Plan> {
    KNOWN_PLANS.iter().find(|p| p.name == name)
}

/// The plans that should be available for provisioning
///
/// Parsed from a comma-separated list of plan names, e.g. `"azure,gcp"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnablePlans(Vec<String>);

impl EnablePlans {
    pub fn parse(input: &str) -> Result<Self, PlanError> {
        let mut plans = Vec::new();
        for name in input.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if known_plan(name).is_none() {
                return Err(PlanError::Unrecognized(name.to_string()));
            }
            if !plans.iter().any(|p| p == name) {
                plans.push(name.to_string());
            }
        }
        if plans.is_empty() {
            return Err(PlanError::Empty);
        }
        Ok(Self(plans))
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl Default for EnablePlans {
    fn default() -> Self {
        Self(vec!["azure".to_string()])
    }
}

impl FromStr for EnablePlans {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EnablePlans {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EnablePlans> for String {
    fn from(plans: EnablePlans) -> Self {
        plans.0.join(",")
    }
}

impl fmt::Display for EnablePlans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// A caller's request before plan resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub plan: String,
    pub name: Option<String>,
    pub region: Option<String>,
    pub machine_type: Option<String>,
    pub components: Vec<String>,
}

/// Immutable catalog of enabled plans
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    enabled: BTreeMap<&'static str, &'static Plan>,
}

impl PlanCatalog {
    pub fn new(enable: &EnablePlans) -> Self {
        let enabled = enable
            .names()
            .iter()
            .filter_map(|name| known_plan(name))
            .map(|plan| (plan.id, plan))
            .collect();
        Self { enabled }
    }

    /// Catalog with every known plan enabled
    pub fn all() -> Self {
        Self {
            enabled: KNOWN_PLANS.iter().map(|plan| (plan.id, plan)).collect(),
        }
    }

    pub fn by_id(&self, plan_id: &str) -> Option<&'static Plan> {
        self.enabled.get(plan_id).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&'static Plan> {
        self.enabled.values().find(|p| p.name == name).copied()
    }

    pub fn plans(&self) -> impl Iterator<Item = &'static Plan> + '_ {
        self.enabled.values().copied()
    }

    /// Resolve a request against an enabled plan. Region and component
    /// validity is left to the pipeline so that it is reported through the
    /// operation rather than rejected synchronously.
    pub fn resolve(&self, request: &ProvisionRequest) -> Result<ProvisioningParameters, PlanError> {
        let plan = match self.by_name(&request.plan) {
            Some(plan) => plan,
            None if known_plan(&request.plan).is_some() => {
                return Err(PlanError::NotEnabled(request.plan.clone()))
            }
            None => return Err(PlanError::Unrecognized(request.plan.clone())),
        };

        Ok(ProvisioningParameters {
            plan_id: plan.id.to_string(),
            plan_name: plan.name.to_string(),
            name: request.name.clone(),
            region: request.region.clone(),
            machine_type: request.machine_type.clone(),
            components: request.components.clone(),
        })
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
