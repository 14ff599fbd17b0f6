use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "lanxpert-test-app")]
#[command(about = "Exercise a running LanXpert API end to end")]
#[command(version = "1.0")]
struct Cli {
    #[arg(long, default_value = "http://localhost:8000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register accounts and log each one in
    TestUsers {
        #[arg(long, default_value_t = 2)]
        count: u32,
    },
    /// Ask a question with one account and answer it with another
    TestQuestions,
    /// Put two complementary learners through random matchmaking
    TestMatchmaking,
    /// Run every scenario
    RunAll,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Language {
    id: String,
    code: String,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: String,
    chat_type: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

struct Session {
    user: User,
    token: String,
}

struct ApiClient {
    client: Client,
    base_url: String,
    run_id: u64,
}

impl ApiClient {
    fn new(base_url: String) -> Self {
        let run_id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self {
            client: Client::new(),
            base_url,
            run_id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn expect_ok<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
        if response.status() != StatusCode::OK {
            let status = response.status();
            let error = response.text().await?;
            return Err(anyhow::anyhow!("{what} failed ({status}): {error}"));
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {what} response"))
    }

    async fn sign_up(&self, name: &str) -> Result<Session> {
        let username = format!("{name}{}", self.run_id);
        let email = format!("{username}@example.com");
        let password = "smoke-test-password";
        println!("Registering user: {username}");

        let response = self
            .client
            .post(self.url("/users"))
            .json(&RegisterRequest {
                username: &username,
                email: &email,
                password,
            })
            .send()
            .await
            .context("Failed to register user")?;
        let user: User = Self::expect_ok(response, "registration").await?;

        let response = self
            .client
            .post(self.url("/token"))
            .form(&[("username", username.as_str()), ("password", password)])
            .send()
            .await
            .context("Failed to log in")?;
        let tokens: TokenResponse = Self::expect_ok(response, "login").await?;

        println!("Signed in as {} ({})", user.username, user.id);
        Ok(Session {
            user,
            token: tokens.access_token,
        })
    }

    async fn get<T: DeserializeOwned>(&self, session: &Session, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&session.token)
            .send()
            .await
            .with_context(|| format!("GET {path} failed"))?;
        Self::expect_ok(response, path).await
    }

    async fn send<T: DeserializeOwned>(&self, session: &Session, method: reqwest::Method, path: &str, body: Value) -> Result<T> {
        let response = self
            .client
            .request(method.clone(), self.url(path))
            .bearer_auth(&session.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{method} {path} failed"))?;
        Self::expect_ok(response, path).await
    }

    async fn language_id(&self, code: &str) -> Result<String> {
        let languages: Vec<Language> = self
            .client
            .get(self.url("/languages"))
            .send()
            .await?
            .json()
            .await
            .context("Failed to parse languages")?;
        languages
            .into_iter()
            .find(|language| language.code == code)
            .map(|language| language.id)
            .with_context(|| format!("language {code} is not seeded"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api_client = ApiClient::new(cli.api_url);

    println!("LanXpert API Test App");
    println!("=====================");

    match cli.command {
        Commands::TestUsers { count } => test_users(&api_client, count).await?,
        Commands::TestQuestions => test_questions(&api_client).await?,
        Commands::TestMatchmaking => test_matchmaking(&api_client).await?,
        Commands::RunAll => run_all_tests(&api_client).await?,
    }

    println!("\nAll tests completed successfully!");
    Ok(())
}

async fn test_users(api_client: &ApiClient, count: u32) -> Result<()> {
    println!("\nTesting Users");
    println!("=============");

    for i in 1..=count {
        match api_client.sign_up(&format!("smoke{i}_")).await {
            Ok(session) => {
                let me: Value = api_client.get(&session, "/users/me").await?;
                println!("User {i}: level {}, roles {}", me["current_level"], me["roles"]);
            }
            Err(e) => println!("Failed to create user {i}: {e}"),
        }
    }
    Ok(())
}

async fn test_questions(api_client: &ApiClient) -> Result<()> {
    println!("\nTesting Questions");
    println!("=================");

    let asker = api_client.sign_up("asker").await?;
    let helper = api_client.sign_up("helper").await?;

    let question: Value = api_client
        .send(
            &asker,
            reqwest::Method::POST,
            "/questions",
            json!({ "question_text": "When do I use 'de' versus 'da'?" }),
        )
        .await?;
    let question_id = question["id"].as_str().unwrap_or_default();
    println!("Asked question {question_id}");

    api_client
        .send::<Value>(
            &helper,
            reqwest::Method::POST,
            "/answers",
            json!({ "question_id": question_id, "answer_text": "It follows vowel harmony." }),
        )
        .await?;

    let unread: Value = api_client.get(&asker, "/notifications/unread-count").await?;
    println!("Asker has {} unread notification(s)", unread["count"]);
    Ok(())
}

async fn test_matchmaking(api_client: &ApiClient) -> Result<()> {
    println!("\nTesting Matchmaking");
    println!("===================");

    let english = api_client.language_id("en").await?;
    let turkish = api_client.language_id("tr").await?;

    let first = api_client.sign_up("ayse").await?;
    let second = api_client.sign_up("john").await?;

    api_client
        .send::<Value>(
            &first,
            reqwest::Method::PUT,
            "/users/me",
            json!({ "native_language_id": turkish, "target_language_id": english }),
        )
        .await?;
    api_client
        .send::<Value>(
            &second,
            reqwest::Method::PUT,
            "/users/me",
            json!({ "native_language_id": english, "target_language_id": turkish }),
        )
        .await?;

    let queued: Chat = api_client
        .send(&first, reqwest::Method::POST, "/chats/random", json!({}))
        .await?;
    println!("{} waits in {} ({})", first.user.username, queued.id, queued.chat_type);

    let matched: Chat = api_client
        .send(&second, reqwest::Method::POST, "/chats/random", json!({}))
        .await?;
    println!("{} joined {} ({})", second.user.username, matched.id, matched.chat_type);

    let messages: Vec<Value> = api_client
        .get(&second, &format!("/chats/{}/messages", matched.id))
        .await?;
    for message in messages {
        println!("  > {}", message["content"]);
    }
    Ok(())
}

async fn run_all_tests(api_client: &ApiClient) -> Result<()> {
    println!("Running All Tests");
    println!("=================");

    test_users(api_client, 2).await?;
    test_questions(api_client).await?;
    test_matchmaking(api_client).await?;
    Ok(())
}
