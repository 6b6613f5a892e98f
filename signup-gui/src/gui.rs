use iced::{Element, Task};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;

use signup::{
    client::{AuthClient, AuthRequest},
    config::Config as Settings,
    dir::DataDirectory,
    session::{Session, SessionStore},
    state::{Command, Msg, RequestId, State},
    VERSION,
};

use crate::{logger::setup_logger, view};

pub struct Config {
    pub datadir: DataDirectory,
    pub settings: Settings,
    /// Overrides the level of the settings when set.
    pub log_level: Option<LevelFilter>,
}

pub struct Gui {
    state: State,
    client: AuthClient,
    store: SessionStore,
}

#[derive(Debug, Clone)]
pub enum Message {
    CtrlC,
    Form(Msg),
    SessionStored(Result<(), String>),
}

async fn authenticate(client: AuthClient, id: RequestId, request: AuthRequest) -> Msg {
    let res = client.authenticate(&request).await.map(Session::new);
    Msg::Authenticated(id, res)
}

async fn fetch_products(client: AuthClient, session: Session) -> Msg {
    let res = client.products(session.token()).await;
    Msg::ProductsLoaded(session, res)
}

async fn ctrl_c() -> Result<(), ()> {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("{}", e);
    };
    info!("Signal received, exiting");
    Ok(())
}

impl Gui {
    pub fn title(&self) -> String {
        format!("{} - Signup v{}", self.state.mode.title(), VERSION)
    }

    pub fn new(config: Config) -> (Gui, Task<Message>) {
        let log_level = config.log_level.unwrap_or(config.settings.log_level);
        if let Err(e) = setup_logger(log_level, &config.datadir) {
            tracing::warn!("Error while setting up the logger: {}", e);
        }
        info!(
            "Starting {:?} form against {}",
            config.settings.variant, config.settings.api_base_url
        );

        let store = SessionStore::new(&config.datadir);
        let session = match store.load() {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to load the persisted session: {}", e);
                None
            }
        };
        let (state, cmd) = State::new(config.settings.variant, session);
        let gui = Self {
            state,
            client: AuthClient::new(config.settings.api_base_url),
            store,
        };
        let task = Task::batch([Task::perform(ctrl_c(), |_| Message::CtrlC), gui.run(cmd)]);
        (gui, task)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::CtrlC => iced::exit(),
            Message::Form(msg) => {
                let (state, cmd) = std::mem::take(&mut self.state).update(msg);
                self.state = state;
                self.run(cmd)
            }
            Message::SessionStored(res) => {
                if let Err(e) = res {
                    error!("Failed to update the persisted session: {}", e);
                }
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        view::form_view(&self.state).map(Message::Form)
    }

    /// Run the side effect of a state transition, feeding its result back to the form.
    fn run(&self, cmd: Command) -> Task<Message> {
        match cmd {
            Command::None => Task::none(),
            Command::Batch(cmds) => Task::batch(cmds.into_iter().map(|cmd| self.run(cmd))),
            Command::Authenticate { id, request } => Task::perform(
                authenticate(self.client.clone(), id, request),
                Message::Form,
            ),
            Command::FetchProducts(session) => Task::perform(
                fetch_products(self.client.clone(), session),
                Message::Form,
            ),
            // Tickets are taken here so the file ends up in the order the
            // commands were issued, whichever task completes first.
            Command::StoreSession(session) => {
                let store = self.store.clone();
                let ticket = store.reserve();
                Task::perform(
                    async move {
                        store
                            .persist(ticket, Some(&session))
                            .await
                            .map_err(|e| e.to_string())
                    },
                    Message::SessionStored,
                )
            }
            Command::ClearSession => {
                let store = self.store.clone();
                let ticket = store.reserve();
                Task::perform(
                    async move { store.persist(ticket, None).await.map_err(|e| e.to_string()) },
                    Message::SessionStored,
                )
            }
        }
    }
}
