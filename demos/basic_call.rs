//! Basic demo of fluent GET and POST requests against JSONPlaceholder.
//!
//! Run with: `cargo run --example basic_call`

use ferrapi::{ApiEvent, ApiHandler, Error};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("ferrapi=debug,basic_call=info")
        .init();

    let handler = ApiHandler::builder()
        .base_address("https://jsonplaceholder.typicode.com")?
        .resource("posts")
        .timeout(Duration::from_secs(10))
        .retry_attempts(3)
        .build()?;

    let mut events = handler.subscribe();

    println!("=== GET posts/1 ===");
    let response = handler
        .request()
        .get()
        .with_parameter(1)
        .responds_with::<Post>()
        .execute()
        .await?;

    match &response.data {
        Some(post) => {
            println!("Post ID: {}", post.id);
            println!("Title: {}", post.title);
        }
        None => println!("No post: {:?}", response.message),
    }
    println!("Status: {}", response.status);
    println!("Latency: {:?}", response.latency);
    println!();

    println!("=== POST posts ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };
    let response = handler
        .request()
        .post()
        .with_content(&new_post)?
        .responds_with::<Post>()
        .execute()
        .await?;

    if let Some(post) = response.data {
        println!("Created post with ID: {}", post.id);
    }
    println!("Status: {}", response.status);
    println!();

    println!("=== GET posts?userId=1 ===");
    let response = handler
        .request()
        .get()
        .with_query("userId", 1)
        .responds_with::<Vec<Post>>()
        .execute()
        .await?;
    println!(
        "User 1 has {} posts",
        response.data.map(|posts| posts.len()).unwrap_or_default()
    );
    println!();

    println!("=== GET posts/999999 ===");
    let response = handler
        .request()
        .get()
        .with_parameter(999_999)
        .responds_with::<Post>()
        .execute()
        .await?;
    println!(
        "Successful: {}, status: {}, message: {:?}",
        response.was_successful, response.status, response.message
    );

    handler.dispose();

    println!();
    println!("=== Events ===");
    while let Ok(event) = events.try_recv() {
        match event {
            ApiEvent::ResponseReceived {
                request_id,
                status,
                attempts,
            } => println!("{} -> {} after {} attempt(s)", request_id, status, attempts),
            ApiEvent::Disposed => println!("handler disposed"),
            _ => {}
        }
    }

    Ok(())
}
