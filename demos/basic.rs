use efetch::{ClientConfig, EfetchClient, RequestOptions};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Todo {
    id: i64,
    title: String,
    completed: bool,
}

#[allow(non_snake_case)]
#[derive(Serialize)]
struct NewTodo {
    Title: String,
    Completed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "efetch=info".into()))
        .init();

    let config = ClientConfig::from_env()
        .unwrap_or_else(|_| ClientConfig::new("https://jsonplaceholder.typicode.com"))
        .with_header("Accept", "application/json");
    let client = EfetchClient::new(config)?;

    let todo: Todo = client.get("/todos", RequestOptions::with_id(1)).await?;
    println!("{} {} (done: {})", todo.id, todo.title, todo.completed);

    let created: serde_json::Value = client
        .post(
            "/todos",
            &NewTodo {
                Title: "buy milk".to_owned(),
                Completed: false,
            },
            (),
        )
        .await?;
    println!("{created}");

    let page: Vec<Todo> = client
        .get("/todos", RequestOptions::new().query("userId", "1"))
        .await?;
    println!("user 1 has {} todos", page.len());

    Ok(())
}
