// FormRelay - Workflow catalog
//
// Static mapping from client-facing workflow ids to upstream endpoint ids.
// Built once at startup and shared read-only.

pub mod parser;
pub mod pipeline;

use crate::content::ContentKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate workflow id: {0}")]
    DuplicateId(String),
    #[error("workflow '{0}' has an empty upstream endpoint id")]
    EmptyEndpoint(String),
    #[error("workflow id must not be empty")]
    EmptyId,
    #[error("endpoint override for unknown workflow: {0}")]
    UnknownOverride(String),
}

/// Which submitted fields go into the outbound body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    /// Only the required fields that were submitted.
    Subset,
    /// The whole field mapping, as submitted.
    #[default]
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDescriptor {
    pub id: String,
    pub upstream_endpoint_id: String,
    #[serde(default)]
    pub required_field_names: Vec<String>,
    #[serde(default)]
    pub body: BodyMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_kind: Option<ContentKind>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WorkflowDescriptor {
    pub fn new(id: &str, endpoint: &str, required: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            upstream_endpoint_id: endpoint.to_string(),
            required_field_names: required.iter().map(|s| s.to_string()).collect(),
            body: BodyMode::Passthrough,
            content_kind: None,
            name: id.to_string(),
            description: None,
        }
    }

    pub fn subset(mut self) -> Self {
        self.body = BodyMode::Subset;
        self
    }

    pub fn kind(mut self, kind: ContentKind) -> Self {
        self.content_kind = Some(kind);
        self
    }

    pub fn named(mut self, name: &str, description: &str) -> Self {
        self.name = name.to_string();
        self.description = Some(description.to_string());
        self
    }

    /// Required fields that are absent or blank in `fields`.
    pub fn missing_fields(&self, fields: &BTreeMap<String, String>) -> Vec<String> {
        self.required_field_names
            .iter()
            .filter(|name| fields.get(*name).is_none_or(|v| v.trim().is_empty()))
            .cloned()
            .collect()
    }

    /// The JSON body sent upstream for a submission.
    pub fn outbound_body(&self, fields: &BTreeMap<String, String>) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = match self.body {
            BodyMode::Passthrough => fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
            BodyMode::Subset => self
                .required_field_names
                .iter()
                .filter_map(|name| {
                    fields
                        .get(name)
                        .map(|v| (name.clone(), serde_json::Value::String(v.clone())))
                })
                .collect(),
        };
        serde_json::Value::Object(map)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable, ordered set of workflow descriptors.
#[derive(Debug, Clone, Default)]
pub struct WorkflowCatalog {
    workflows: Vec<WorkflowDescriptor>,
    index: HashMap<String, usize>,
}

impl WorkflowCatalog {
    /// Build a catalog, rejecting duplicate ids and empty endpoints.
    pub fn new(workflows: Vec<WorkflowDescriptor>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(workflows.len());
        for (i, wf) in workflows.iter().enumerate() {
            if wf.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if wf.upstream_endpoint_id.trim().is_empty() {
                return Err(CatalogError::EmptyEndpoint(wf.id.clone()));
            }
            if index.insert(wf.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(wf.id.clone()));
            }
        }
        Ok(Self { workflows, index })
    }

    /// Built-in catalog with endpoint overrides applied.
    ///
    /// Overrides replace the endpoint of a built-in workflow, or enable one of
    /// the optional workflows (`workout`, `meal`) that ship without an endpoint.
    pub fn with_overrides(
        base: Vec<WorkflowDescriptor>,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, CatalogError> {
        let mut workflows = base;

        for wf in workflows.iter_mut() {
            if let Some(endpoint) = overrides.get(&wf.id) {
                wf.upstream_endpoint_id = endpoint.clone();
            }
        }

        for template in optional_workflows() {
            if workflows.iter().any(|w| w.id == template.id) {
                continue;
            }
            if let Some(endpoint) = overrides.get(&template.id) {
                let mut wf = template;
                wf.upstream_endpoint_id = endpoint.clone();
                workflows.push(wf);
            }
        }

        for id in overrides.keys() {
            if !workflows.iter().any(|w| &w.id == id) {
                return Err(CatalogError::UnknownOverride(id.clone()));
            }
        }

        Self::new(workflows)
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowDescriptor> {
        self.index.get(id).map(|&i| &self.workflows[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkflowDescriptor> {
        self.workflows.iter()
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Built-in workflows
// ---------------------------------------------------------------------------

pub const WORKOUT: &str = "workout";
pub const MEAL: &str = "meal";

const BUSINESS_FIELDS: &[&str] = &[
    "BusinessPlan",
    "ProductName",
    "CompanyName",
    "MissionStatement",
    "BusinessObjectives",
    "BusinessOverview",
    "MarketNeeds",
    "UniqueSellingProposition",
];

/// The workflows every deployment knows about.
pub fn builtin_workflows() -> Vec<WorkflowDescriptor> {
    vec![
        WorkflowDescriptor::new("story", "wf_b1c45lj9pabaotitahwfk9gb", &["story"])
            .subset()
            .kind(ContentKind::Story)
            .named("Story Generator", "Write a short story from a prompt"),
        WorkflowDescriptor::new("food", "wf_kje4ajgswaebfx7upzmbrfr9", &["food"])
            .subset()
            .kind(ContentKind::Food)
            .named("Recipe Generator", "Turn a dish name into a recipe"),
        WorkflowDescriptor::new("business", "wf_dlo0arja3o4x3s7m8gtayyxu", BUSINESS_FIELDS)
            .kind(ContentKind::Business)
            .named("Business Plan Generator", "Draft a business plan"),
        WorkflowDescriptor::new(
            "website-content",
            "wf_p2wq82lst0zv8ai4xzqngg9c",
            &[
                "urldomain",
                "websiteapge",
                "keyword",
                "intent",
                "objective",
                "outboundlinks",
                "internallinks",
                "images",
            ],
        )
        .kind(ContentKind::Business)
        .named("Website Content Generator", "Create engaging website content"),
        WorkflowDescriptor::new(
            "executive-summary",
            "wf_rnt83hja65v396tfacrkc90v",
            &[
                "BusinessPlan",
                "ProductName",
                "CompanyName",
                "MissionStatement",
                "BusinessObjectives",
                "BusinessOverview",
                "MarketNeeds",
                "UniqueSellingProposition",
                "objective",
            ],
        )
        .kind(ContentKind::Business)
        .named("Executive Summary", "Generate comprehensive business summaries"),
        WorkflowDescriptor::new(
            "market-analysis",
            "wf_l16fob3uhzbla275dliwa7xw",
            &[
                "MarketAnalysis",
                "IndustryOverview",
                "TargetMarket",
                "CompetitiveAnalysis",
                "Business",
                "city",
                "state",
                "googleorganic",
                "products",
                "services",
            ],
        )
        .kind(ContentKind::Business)
        .named("Market Analysis", "Analyze market trends and opportunities"),
        WorkflowDescriptor::new(
            "product-line",
            "wf_dqdzodpzkeygaozu6axhesmb",
            &[
                "ExecutiveSummary",
                "ProductDescription",
                "CompanyName",
                "FeaturesandBenefits",
                "customer",
                "ProductLifecycle",
                "customerjourney",
                "Customerlifetimevalue",
                "BusinessOverview",
                "MarketNeeds",
                "UniqueSellingProposition",
            ],
        )
        .kind(ContentKind::Business)
        .named("Product Line Summary", "Detail your product offerings"),
        WorkflowDescriptor::new(
            "market-strategy",
            "wf_acuyc5g9m7srgizvmx24b5ke",
            &[
                "MarketingStrategy",
                "company",
                "state",
                "IndustryOverview",
                "Demographic",
                "TargetMarket",
                "digitalmarketing",
                "socialmediamarketing",
                "contentStrategy",
                "emailmarketing",
                "organicsearch",
                "AIsearch",
                "idealcustomers",
                "customerjourney",
                "city",
                "platforms",
                "googleorganic",
                "products",
                "services",
            ],
        )
        .kind(ContentKind::Business)
        .named("Marketing Strategy", "Develop comprehensive marketing strategies"),
        WorkflowDescriptor::new(
            "sales-strategy",
            "wf_kairwr8n4qqd8fvnvpq9z4sk",
            &[
                "Salesgoals",
                "company",
                "state",
                "IndustryOverview",
                "Demographic",
                "TargetMarket",
                "digitalmarketing",
                "socialmediamarketing",
                "contentStrategy",
                "emailmarketing",
                "organicsearch",
                "AIsearch",
                "idealcustomers",
                "customerjourney",
                "city",
                "LongTermSalesgoals",
                "MidTermSalesgoals",
                "ShortTermSalesgoals",
                "leadgenerationsystems",
                "marketing",
                "networking",
                "benchmarks",
                "timeframe",
                "monthly",
                "quarterly",
                "annually",
                "twoyears",
                "SystematizeStandardOperatingProcedures",
                "marketingchannels",
            ],
        )
        .kind(ContentKind::Business)
        .named("Sales Strategy", "Plan your sales approach"),
        WorkflowDescriptor::new(
            "operations-plan",
            "wf_xuj87kcpg5oeia7qudl2m2l6",
            &[
                "OperationsPlan",
                "company",
                "state",
                "IndustryOverview",
                "Demographic",
                "TargetMarket",
                "Workflows",
                "leadgeneration",
                "contentcreation",
                "digitalplatforms",
                "digitalmarketing",
                "website",
                "socialmedia",
                "contentStrategy",
                "emailmarketing",
                "organicsearch",
                "AIsearch",
                "idealcustomers",
                "customerjourney",
                "SystematizeStandardOperatingProcedures",
                "idealclients",
            ],
        )
        .kind(ContentKind::Business)
        .named("Operations Plan", "Structure your business operations"),
    ]
}

/// Workflows with no default endpoint; enabled only by configuration.
pub fn optional_workflows() -> Vec<WorkflowDescriptor> {
    vec![
        WorkflowDescriptor::new(WORKOUT, "", &["bodypart", "difficulty", "time"])
            .subset()
            .kind(ContentKind::Workout)
            .named("Workout Planner", "Build a workout for a body part"),
        WorkflowDescriptor::new(MEAL, "", &[pipeline::MEAL_INPUT_FIELD])
            .subset()
            .named("Meal Planner", "Suggest meals that fit a workout"),
    ]
}
