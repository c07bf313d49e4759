//! Interactive client: a simulated player driven from the console.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    config::ClientConfig,
    engine::{EngineHandle, SyncEngine},
    error::ClientError,
    formatter::StatusFormatter,
    media::fetch_media_list,
    player::{MediaElement, SimulatedElement},
    ui::{ConsoleCommand, redisplay_prompt},
};

/// Run the console client until the user quits or the engine stops
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let participant_id = config.participant_id.clone();

    let media = match fetch_media_list(&reqwest::Client::new(), &config.media_url()).await {
        Ok(media) => media,
        Err(e) => {
            tracing::warn!("{}; continuing without a media list", e);
            Vec::new()
        }
    };

    let (element, element_events) = SimulatedElement::new();
    let (mut engine, mut notifications) =
        SyncEngine::new(config, element.clone(), element_events)
            .with_media(media)
            .spawn();

    println!(
        "\nYou are '{}'. Type 'help' for commands. Press Ctrl+C to exit.\n",
        participant_id
    );

    let mut input_rx = spawn_readline(participant_id.clone());

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                match ConsoleCommand::parse(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => execute(command, &element, &engine).await,
                    Err(e) => println!("{}", e),
                }
            }
            Some(event) = notifications.recv() => {
                print!("{}", StatusFormatter::format_event(&event, &participant_id));
                redisplay_prompt(&participant_id);
            }
            result = engine.wait() => {
                return result;
            }
        }
    }

    engine.shutdown().await
}

/// Commands act on the element the way a viewer would; the engine sees the
/// resulting element events
async fn execute(command: ConsoleCommand, element: &SimulatedElement, engine: &EngineHandle) {
    match command {
        ConsoleCommand::Play => element.play(),
        ConsoleCommand::Pause => element.pause(),
        ConsoleCommand::Seek(secs) => element.seek(secs),
        ConsoleCommand::Buffer => element.set_buffering(true),
        ConsoleCommand::Unbuffer => element.set_buffering(false),
        ConsoleCommand::Media(index) => {
            if let Err(e) = engine.set_media_index(index) {
                println!("{}", e);
            }
        }
        ConsoleCommand::Status => match engine.status().await {
            Ok(report) => print!("{}", StatusFormatter::format_status(&report)),
            Err(e) => println!("{}", e),
        },
        ConsoleCommand::Help => print!("{}", StatusFormatter::format_help()),
        ConsoleCommand::Quit => {}
    }
}

/// Read lines on a blocking thread (rustyline is synchronous)
fn spawn_readline(participant_id: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", participant_id);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
