use std::sync::Arc;

use clap::Args;
use clap::Subcommand;
use database::DbConnectionPoolV2;
use search::SearchClient;

use dossier_models::Content;
use dossier_models::Document;
use dossier_models::Person;
use dossier_models::prelude::*;

#[derive(Subcommand, Debug)]
pub enum SearchCommands {
    #[command(about, long_about = "Creates the missing search indices")]
    CreateIndices,
    Reindex(ReindexArgs),
}

#[derive(Args, Debug)]
#[command(
    about,
    long_about = "Replays every stored record into the search index. The store is \
    the source of truth: the mirror can always be rebuilt from it."
)]
pub struct ReindexArgs {
    /// The entities to reindex. If none, all entities are reindexed
    entities: Vec<String>,
}

pub async fn create_indices(search_client: Arc<SearchClient>) -> anyhow::Result<()> {
    for index in search::INDICES {
        search_client.ensure_index_exists(index).await?;
        println!("✅ Index {index} is ready");
    }
    Ok(())
}

pub async fn reindex(
    args: ReindexArgs,
    db_pool: Arc<DbConnectionPoolV2>,
    search_client: Arc<SearchClient>,
) -> anyhow::Result<()> {
    let entities = if args.entities.is_empty() {
        search::INDICES.map(ToOwned::to_owned).to_vec()
    } else {
        args.entities
    };

    for entity in entities {
        match entity.as_str() {
            "person" => {
                let people = Person::list(&mut db_pool.get().await?).await?;
                let count = people.len();
                for person in people {
                    search_client
                        .index(search::PERSON_INDEX, person.id, &person)
                        .await?;
                }
                println!("♻️  Reindexed {count} people");
            }
            "document" => {
                let documents = Document::list(&mut db_pool.get().await?).await?;
                let count = documents.len();
                for document in documents {
                    search_client
                        .index(search::DOCUMENT_INDEX, document.id, &document)
                        .await?;
                }
                println!("♻️  Reindexed {count} documents");
            }
            "content" => {
                let contents = Content::list(&mut db_pool.get().await?).await?;
                let count = contents.len();
                for content in contents {
                    search_client
                        .index(search::CONTENT_INDEX, content.id, &content)
                        .await?;
                }
                println!("♻️  Reindexed {count} contents");
            }
            unknown => {
                eprintln!("❗ No entity found for {unknown}");
            }
        }
    }
    Ok(())
}
