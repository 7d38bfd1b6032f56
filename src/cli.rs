use std::io::{self, Write};
use kvsearch::{Document, DocumentId, SearchService};

#[derive(Debug, PartialEq)]
pub enum Command {
    Ingest { id: DocumentId, text: String },
    Query { text: String, top_k: usize },
    Get { slot: usize },
    Count,
}

/// Parse a command from a provided argument vector
/// args[0] is the program name, args[1] the command
pub fn parse_command_from_args(args: &[String]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("No command provided. Use: ingest, query, get, count".to_string());
    }

    let command = &args[1];

    match command.as_str() {
        "ingest" => parse_ingest(args),
        "query" => parse_query(args),
        "get" => parse_get(args),
        "count" => parse_count(args),
        _ => Err(format!("Unknown command: {}. Available: ingest, query, get, count", command)),
    }
}

/// Parse the 'ingest' command
/// Usage: ingest <id> <text...>
fn parse_ingest(args: &[String]) -> Result<Command, String> {
    // args[2] = id (required)
    // args[3..] = text words (required, at least 1)
    if args.len() < 4 {
        return Err("'ingest' command requires an ID and text. Usage: ingest <id> <text...>".to_string());
    }

    let id = match args[2].parse::<i64>() {
        Ok(n) => DocumentId::Int(n),
        Err(_) => DocumentId::Text(args[2].clone()),
    };
    let text = args[3..].join(" ");

    Ok(Command::Ingest { id, text })
}

/// Parse the 'query' command
/// Usage: query <text...> [--top_k <number>]
fn parse_query(args: &[String]) -> Result<Command, String> {
    if args.len() < 3 {
        return Err("'query' command requires text. Usage: query <text...> [--top_k <number>]".to_string());
    }

    let mut top_k = 1; // default value
    let mut text_end = args.len();

    // Check if last two args are --top_k and a number
    if args.len() >= 4 && args[args.len() - 2] == "--top_k" {
        match args[args.len() - 1].parse::<usize>() {
            Ok(k) if k >= 1 => {
                top_k = k;
                text_end = args.len() - 2;
            }
            _ => {
                return Err(format!("Invalid --top_k value: '{}'. Must be a positive integer.", args[args.len() - 1]));
            }
        }
    }

    let text = args[2..text_end].join(" ");
    if text.is_empty() {
        return Err("Query text cannot be empty".to_string());
    }

    Ok(Command::Query { text, top_k })
}

/// Parse the 'get' command
/// Usage: get <slot>
fn parse_get(args: &[String]) -> Result<Command, String> {
    if args.len() < 3 {
        return Err("'get' command requires a slot. Usage: get <slot>".to_string());
    }

    match args[2].parse::<usize>() {
        Ok(slot) => Ok(Command::Get { slot }),
        Err(_) => Err(format!("Invalid slot: '{}'", args[2])),
    }
}

/// Parse the 'count' command
/// Usage: count
fn parse_count(args: &[String]) -> Result<Command, String> {
    if args.len() > 2 {
        eprintln!("Warning: 'count' command takes no arguments, ignoring extras");
    }

    Ok(Command::Count)
}

/// REPL mode - interactive session against one in-memory service
pub fn run_repl(service: &SearchService) -> io::Result<()> {
    println!("KVSearch - Vector Similarity Search");
    println!("{} documents loaded. Type 'help' for commands, 'exit' or 'quit' to quit\n", service.len());

    loop {
        print!("kvsearch> ");
        io::stdout().flush()?;

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input == "exit" || input == "quit" {
            println!("Goodbye!");
            break;
        }

        if input == "help" {
            print_help();
            continue;
        }

        let mut args: Vec<String> = vec!["kvsearch".to_string()];
        args.extend(input.split_whitespace().map(|s| s.to_string()));

        let command = match parse_command_from_args(&args) {
            Ok(cmd) => cmd,
            Err(error) => {
                eprintln!("Error: {}", error);
                continue;
            }
        };

        execute_command(service, command);
    }

    Ok(())
}

fn execute_command(service: &SearchService, command: Command) {
    match command {
        Command::Ingest { id, text } => {
            match service.ingest(Document { id: id.clone(), text }) {
                Ok(slot) => println!("Document {} added at slot {}", id, slot),
                Err(error) => eprintln!("Error: {}", error),
            }
        }

        Command::Query { text, top_k } => {
            match service.query(&text, top_k) {
                Ok(results) => {
                    if results.is_empty() {
                        println!("No results found");
                    } else {
                        println!("Top {} results:", results.len());
                        for (rank, hit) in results.iter().enumerate() {
                            println!("{}. ID: {}, Score: {:.4}, Text: {}",
                                rank + 1, hit.id, hit.score, hit.text);
                        }
                    }
                }
                Err(error) => eprintln!("Error: {}", error),
            }
        }

        Command::Get { slot } => {
            match service.document(slot) {
                Some(record) => println!("Slot {}: [{}] {}", slot, record.id, record.text),
                None => eprintln!("Error: Slot {} not found", slot),
            }
        }

        Command::Count => println!("{}", service.len()),
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  ingest <id> <text...>             - Embed and store a document");
    println!("  query <text...> [--top_k N]       - Find the nearest documents (default k=1)");
    println!("  get <slot>                        - Show the document stored at a slot");
    println!("  count                             - Show document count");
    println!("  help                              - Show this help");
    println!("  exit, quit                        - Exit the program");
}
