use clap::Parser;
use clue_shared::{Request, RequestFrame, ServerFrame, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Signs in, creates or joins a table and prints everything the server sends
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server WebSocket URL
    #[clap(long, default_value = "ws://127.0.0.1:8080")]
    url: String,
    /// Player name
    #[clap(long, default_value = "tester")]
    name: String,
    /// Join this table instead of creating one
    #[clap(long)]
    game: Option<String>,
    /// Seconds to keep listening after the last frame
    #[clap(long, default_value = "5")]
    linger_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Connecting to {}", args.url);
    let (ws, _) = connect_async(args.url.as_str()).await?;
    let (mut sink, mut stream) = ws.split();

    let requests = vec![
        Request::SignIn {
            name: args.name.clone(),
            token: None,
        },
        match &args.game {
            Some(game_id) => Request::JoinGame {
                game_id: game_id.clone(),
            },
            None => Request::CreateGame,
        },
    ];

    for (req_id, request) in requests.into_iter().enumerate() {
        let frame = RequestFrame {
            req_id: req_id as u32 + 1,
            request,
        };
        println!("-> {:?}", frame);
        sink.send(Message::Text(serde_json::to_string(&frame)?))
            .await?;
    }

    let linger = Duration::from_secs(args.linger_secs);
    while let Ok(Some(message)) = timeout(linger, stream.next()).await {
        match message? {
            Message::Text(text) => match serde_json::from_str::<ServerFrame>(&text) {
                Ok(frame) => {
                    if let ServerMessage::CreateGameResp { game_id, .. } = &frame.message {
                        println!("Created table {}", game_id);
                    }
                    println!("<- {:?}", frame);
                }
                Err(e) => println!("Undecodable frame ({}): {}", e, text),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    println!("Done");
    Ok(())
}
