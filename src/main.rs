use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use base64::Engine;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::sync::{watch, Mutex};
use tracing::info;

use sofimar_admin::api::HttpCollectionClient;
use sofimar_admin::collections::{
    Certificates, Chatbot, ChatbotResponses, Collection, Locations, Messages, Partners, Reviews,
    TikTokVideos,
};
use sofimar_admin::models::{
    Certificate, CertificateKind, ChatbotResponse, ContactMessage, Location, Partner, Review,
    TikTokVideo,
};
use sofimar_admin::service::{poll, CollectionEditor, Notice, Snapshot};
use sofimar_admin::{AdminConfig, AdminError, AdminPanel, SessionState};

/// Sofimar back-office from the terminal.
#[derive(Parser, Debug)]
#[command(name = "sofimar-admin", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Dashboard counters
    Stats,
    /// Print a collection
    List { collection: CollectionName },
    /// Delete one item (for chatbot, its whole conversation)
    Delete { collection: CollectionName, id: String },
    /// Delete every item of a collection
    Clear { collection: CollectionName },
    /// Keep printing a collection as it changes
    Watch { collection: CollectionName },
    #[command(subcommand)]
    Add(AddCommand),
    /// Change a saved item in place
    #[command(subcommand)]
    Edit(EditCommand),
    /// Save all contact messages as JSON
    ExportMessages {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Change the admin password
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    #[command(subcommand)]
    Texts(TextsCommand),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CollectionName {
    Messages,
    Chatbot,
    Responses,
    Videos,
    Certificates,
    Partners,
    Reviews,
    Locations,
}

#[derive(Subcommand, Debug)]
enum AddCommand {
    Message {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        message: String,
    },
    Certificate {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum, default_value_t = KindArg::Certificat)]
        kind: KindArg,
        #[command(flatten)]
        image: ImageArgs,
    },
    Partner {
        #[arg(long)]
        title: String,
        #[command(flatten)]
        image: ImageArgs,
    },
    Review {
        #[arg(long)]
        author: String,
        #[arg(long, default_value_t = 5)]
        rating: i64,
        #[arg(long)]
        comment: String,
        #[arg(long)]
        approved: bool,
    },
    Location(LocationArgs),
    Video { video_id: String },
    Response {
        #[arg(long)]
        keyword: String,
        #[arg(long)]
        response: String,
    },
}

#[derive(Subcommand, Debug)]
enum EditCommand {
    Location {
        /// Current name of the location
        id: String,
        #[command(flatten)]
        fields: LocationArgs,
    },
    /// Replace the answer for an existing keyword
    Response {
        #[arg(long)]
        keyword: String,
        #[arg(long)]
        response: String,
    },
}

#[derive(Args, Debug)]
struct LocationArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    phone: String,
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,
    #[arg(long)]
    description: String,
}

impl From<LocationArgs> for Location {
    fn from(args: LocationArgs) -> Self {
        Location {
            name: args.name.trim().to_string(),
            address: args.address.trim().to_string(),
            phone: args.phone.trim().to_string(),
            coordinates: [args.lat, args.lng],
            description: args.description.trim().to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Certificat,
    Acreditare,
}

impl From<KindArg> for CertificateKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Certificat => CertificateKind::Certificat,
            KindArg::Acreditare => CertificateKind::Acreditare,
        }
    }
}

#[derive(Args, Debug)]
#[group(multiple = false)]
struct ImageArgs {
    /// Image URL
    #[arg(long)]
    image: Option<String>,
    /// Local image, embedded as a data URL
    #[arg(long)]
    image_file: Option<PathBuf>,
}

impl ImageArgs {
    fn resolve(&self) -> anyhow::Result<Option<String>> {
        match (&self.image, &self.image_file) {
            (Some(url), _) => Ok(Some(url.clone())),
            (None, Some(path)) => data_url(path).map(Some),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Subcommand, Debug)]
enum TextsCommand {
    /// Print the editable site texts
    Get,
    /// Update fields, given as KEY=VALUE
    Set {
        #[arg(required = true)]
        fields: Vec<String>,
    },
}

/// Runs `$body` with `$c` bound to the descriptor type named by `$name`.
macro_rules! with_collection {
    ($name:expr, $c:ident => $body:expr) => {
        match $name {
            CollectionName::Messages => { type $c = Messages; $body }
            CollectionName::Chatbot => { type $c = Chatbot; $body }
            CollectionName::Responses => { type $c = ChatbotResponses; $body }
            CollectionName::Videos => { type $c = TikTokVideos; $body }
            CollectionName::Certificates => { type $c = Certificates; $body }
            CollectionName::Partners => { type $c = Partners; $body }
            CollectionName::Reviews => { type $c = Reviews; $body }
            CollectionName::Locations => { type $c = Locations; $body }
        }
    };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sofimar_admin=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AdminConfig::from_env();
    info!("Using backend at {}", config.api_base_url);
    let panel = AdminPanel::from_config(config);

    match cli.command {
        Command::Login { username, password } => {
            panel.login(&username, &password).await?;
            println!("Autentificat.");
            if let Some(stats) = panel.stats() {
                println!("{stats}");
            }
        }
        Command::Logout => {
            panel.logout();
            println!("Deconectat.");
        }
        Command::Stats => {
            let stats = panel.api().stats().await?;
            println!("{stats}");
        }
        Command::List { collection } => with_collection!(collection, C => list::<C>(&panel).await?),
        Command::Delete { collection, id } => {
            with_collection!(collection, C => delete::<C>(&panel, &id).await?)
        }
        Command::Clear { collection } => with_collection!(collection, C => clear::<C>(&panel).await?),
        Command::Watch { collection } => with_collection!(collection, C => watch_collection::<C>(&panel).await?),
        Command::Add(add) => run_add(&panel, add).await?,
        Command::Edit(EditCommand::Location { id, fields }) => {
            edit::<Locations>(&panel, &id, fields.into()).await?
        }
        Command::Edit(EditCommand::Response { keyword, response }) => {
            let payload = ChatbotResponse::new(&keyword, &response);
            let id = payload.keyword.clone();
            edit::<ChatbotResponses>(&panel, &id, payload).await?
        }
        Command::ExportMessages { dir } => {
            let path = panel.export_messages(&dir).await?;
            println!("Mesajele au fost exportate în {}", path.display());
        }
        Command::Password { current, new, confirm } => {
            match panel.change_password(&current, &new, &confirm).await {
                Ok(()) => println!("Parola a fost schimbată cu succes!"),
                Err(AdminError::FieldMismatch { .. }) => bail!("Parolele nu se potrivesc!"),
                Err(AdminError::FieldTooShort { min_length, .. }) => {
                    bail!("Parola trebuie să aibă cel puțin {min_length} caractere!")
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Texts(TextsCommand::Get) => {
            for (key, value) in panel.site_texts().await? {
                println!("{key} = {value}");
            }
        }
        Command::Texts(TextsCommand::Set { fields }) => {
            let mut texts = panel.site_texts().await?;
            for field in fields {
                let (key, value) = field
                    .split_once('=')
                    .with_context(|| format!("expected KEY=VALUE, got {field:?}"))?;
                texts.insert(key.trim().to_string(), value.to_string());
            }
            panel.save_site_texts(&texts).await?;
            println!("Textele au fost salvate.");
        }
    }
    Ok(())
}

type HttpEditor<C> = CollectionEditor<C, HttpCollectionClient<C>>;

/// Prints the notice an editor published for a failed operation.
fn report<C: Collection>(editor: &HttpEditor<C>, err: AdminError) -> anyhow::Error {
    match editor.snapshot().notice {
        Some(Notice::Error(text)) => anyhow::Error::new(err).context(text),
        _ if err.is_unauthorized() => {
            anyhow::Error::new(err).context("Sesiunea a expirat. Autentifică-te din nou.")
        }
        _ => err.into(),
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    print!("{}", snapshot.view);
    match &snapshot.notice {
        Some(Notice::Info(text)) => println!("{text}"),
        Some(Notice::Error(text)) => eprintln!("{text}"),
        None => {}
    }
}

async fn loaded<C: Collection>(panel: &AdminPanel) -> anyhow::Result<HttpEditor<C>> {
    let mut editor = panel.editor::<C>();
    if let Err(e) = editor.refresh().await {
        return Err(report(&editor, e));
    }
    Ok(editor)
}

async fn list<C: Collection>(panel: &AdminPanel) -> anyhow::Result<()> {
    let editor = loaded::<C>(panel).await?;
    print_snapshot(&editor.snapshot());
    Ok(())
}

async fn delete<C: Collection>(panel: &AdminPanel, id: &str) -> anyhow::Result<()> {
    let mut editor = loaded::<C>(panel).await?;
    if let Err(e) = panel.delete(&mut editor, id).await {
        return Err(report(&editor, e));
    }
    print_snapshot(&editor.snapshot());
    Ok(())
}

async fn clear<C: Collection>(panel: &AdminPanel) -> anyhow::Result<()> {
    let mut editor = loaded::<C>(panel).await?;
    if let Err(e) = panel.clear_all(&mut editor).await {
        return Err(report(&editor, e));
    }
    print_snapshot(&editor.snapshot());
    Ok(())
}

async fn add<C: Collection>(panel: &AdminPanel, payload: C::Payload) -> anyhow::Result<()> {
    let mut editor = loaded::<C>(panel).await?;
    match panel.add(&mut editor, payload).await {
        Ok(id) => {
            print_snapshot(&editor.snapshot());
            println!("Adăugat: {id}");
            Ok(())
        }
        Err(e) => Err(report(&editor, e)),
    }
}

async fn edit<C: Collection>(panel: &AdminPanel, id: &str, payload: C::Payload) -> anyhow::Result<()> {
    let mut editor = loaded::<C>(panel).await?;
    match editor.update(id, payload).await {
        Ok(id) => {
            print_snapshot(&editor.snapshot());
            println!("Actualizat: {id}");
            Ok(())
        }
        Err(e) => Err(report(&editor, e)),
    }
}

async fn watch_collection<C: Collection>(panel: &AdminPanel) -> anyhow::Result<()> {
    let editor = Arc::new(Mutex::new(panel.editor::<C>()));
    let mut snapshots = editor.lock().await.subscribe();
    let (stop, shutdown) = watch::channel(false);
    let poller = tokio::spawn(poll(editor.clone(), panel.config().poll_interval, shutdown));
    let mut session_state = panel.session().subscribe();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                println!("── {} ──", C::NAME);
                print_snapshot(&snapshot);
            }
            _ = tokio::signal::ctrl_c() => break,
            _ = session_state.wait_for(|s| *s != SessionState::Active) => {
                eprintln!("Sesiunea a expirat. Autentifică-te din nou.");
                break;
            }
        }
    }

    stop.send_replace(true);
    poller.await.context("poller task failed")?;
    Ok(())
}

async fn run_add(panel: &AdminPanel, command: AddCommand) -> anyhow::Result<()> {
    match command {
        AddCommand::Message { name, phone, email, message } => {
            let payload = ContactMessage {
                name,
                phone,
                email,
                message,
                timestamp: Some(chrono::Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S").to_string()),
            };
            add::<Messages>(panel, payload).await
        }
        AddCommand::Certificate { title, description, kind, image } => {
            let payload = Certificate {
                title: title.trim().to_string(),
                description: description.filter(|d| !d.trim().is_empty()),
                image: image.resolve()?,
                kind: kind.into(),
            };
            add::<Certificates>(panel, payload).await
        }
        AddCommand::Partner { title, image } => {
            let payload = Partner { title: title.trim().to_string(), image: image.resolve()? };
            add::<Partners>(panel, payload).await
        }
        AddCommand::Review { author, rating, comment, approved } => {
            add::<Reviews>(panel, Review::new(&author, rating, &comment, approved)).await
        }
        AddCommand::Location(fields) => add::<Locations>(panel, fields.into()).await,
        AddCommand::Video { video_id } => {
            add::<TikTokVideos>(panel, TikTokVideo(video_id.trim().to_string())).await
        }
        AddCommand::Response { keyword, response } => {
            add::<ChatbotResponses>(panel, ChatbotResponse::new(&keyword, &response)).await
        }
    }
}

fn data_url(path: &Path) -> anyhow::Result<String> {
    let mime = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => bail!("unsupported image type: {}", path.display()),
    };
    let bytes = std::fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}
