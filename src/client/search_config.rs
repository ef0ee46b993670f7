use clap::Args;
use search::OpensearchClient;
use search::SearchClient;
use url::Url;

use crate::views;

#[derive(Args, Debug, Clone)]
pub struct SearchConfig {
    #[clap(long, env = "DOSSIER_SEARCH_URL", default_value_t = Url::parse("http://localhost:9200").unwrap())]
    pub search_url: Url,
    #[clap(long, env = "DOSSIER_SEARCH_USERNAME", default_value = "admin")]
    pub search_username: String,
    #[clap(long, env = "DOSSIER_SEARCH_PASSWORD", default_value = "admin")]
    pub search_password: String,
}

impl SearchConfig {
    pub fn into_client(self) -> search::Result<SearchClient> {
        Ok(SearchClient::Opensearch(OpensearchClient::new(
            self.search_url,
            self.search_username,
            self.search_password,
        )?))
    }
}

impl From<SearchConfig> for views::SearchConfig {
    fn from(config: SearchConfig) -> Self {
        Self {
            url: config.search_url,
            username: config.search_username,
            password: config.search_password,
        }
    }
}
