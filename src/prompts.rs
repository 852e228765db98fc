use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Analytical instructions sent ahead of the two metrics documents.

pub const GENERAL_ANALYSIS_PROMPT: &str = "Based on the agency metrics and market metrics, \
can you provide a detailed analysis with insights, like by how much % the agency is doing \
better than the market in terms of profits, or what is the sentiment of reviews (or what is \
one common theme), looking at the insights, generate some valuable recommendations on how the \
agency can do better.";

pub const TRAVEL_AGENCY_PROMPT: &str = "You are an expert data analyst specializing in data \
science for travel agencies. Based on the travel agency metrics and market metrics given, can \
you provide a detailed analysis with insights and recommendations, covering and comparing each \
major metric like by how much % the agency is doing better than the market in terms of profits, \
or what is the trending destination, or what's customers preferred travel type or scope of \
improvement based on customer sentiment index or what is the sentiment of reviews (or what is \
one common theme). Looking at the insights, generate concise insights and some concise, \
valuable recommendations on how the agency can do better.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    #[default]
    #[schemars(description = "General performance comparison with recommendations")]
    General,

    #[schemars(description = "Travel-agency specialist prompt with concise insights")]
    TravelAgency,

    #[schemars(description = "Caller-supplied instruction text")]
    Custom(String),
}

impl PromptTemplate {
    pub fn text(&self) -> &str {
        match self {
            PromptTemplate::General => GENERAL_ANALYSIS_PROMPT,
            PromptTemplate::TravelAgency => TRAVEL_AGENCY_PROMPT,
            PromptTemplate::Custom(text) => text,
        }
    }
}
