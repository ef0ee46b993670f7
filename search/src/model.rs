use std::collections::HashMap;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct Hit<T> {
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    #[serde(rename = "_source")]
    pub source: T,
    pub highlight: Option<HashMap<String, Vec<String>>>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct Total {
    pub value: i64,
    pub relation: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct Hits<T> {
    pub total: Total,
    pub max_score: Option<f64>,
    pub hits: Vec<Hit<T>>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct SearchResponse<T> {
    pub hits: Hits<T>,
    pub took: i32,
    pub timed_out: bool,
}
