use crate::catalog::{CatalogClient, Record, RecordDraft, RecordId};
use crate::commands::{self, Command};
use crate::config::Config;
use crate::event::{CatalogEvent, Event, EventHandler};
use crate::projection::{self, Projection};
use crate::store::open_store;
use crate::sync::{parse_strength, LoadOutcome, PageState, RecordFactory, SyncCoordinator};
use crate::ui::{
  self, FormEvent, FormValues, InputResult, KeyResult, RecordForm, SearchEvent, SearchInput,
  TextInput,
};
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Store, sync coordinator and record factory wired together
pub struct Services {
  pub sync: Arc<SyncCoordinator<CatalogClient>>,
  pub factory: RecordFactory,
  /// Records committed by the factory, consumed by the reload listener
  pub created: mpsc::UnboundedReceiver<Record>,
}

impl Services {
  pub fn connect(config: &Config) -> Result<Self> {
    let store = open_store(config);
    let client = CatalogClient::new(&config.catalog)
      .map_err(|e| eyre!("Failed to create catalog client: {}", e))?;

    let sync = Arc::new(SyncCoordinator::new(Arc::clone(&store), client));
    let (factory, created) = RecordFactory::new(store);

    Ok(Self {
      sync,
      factory,
      created,
    })
  }
}

/// Input mode. Search is handled by the search box itself while in Normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
  Form,
}

/// Main application state
pub struct App {
  config: Config,
  sync: Arc<SyncCoordinator<CatalogClient>>,
  factory: RecordFactory,
  /// Taken when the reload listener starts
  created: Option<mpsc::UnboundedReceiver<Record>>,

  /// Full record set, sorted by id, as last reloaded from the store
  records: Vec<Record>,
  /// Index into the visible list
  selected: usize,

  mode: Mode,
  command_input: TextInput,
  selected_command: usize,
  search: SearchInput,
  /// A picked suggestion narrows the list to one record
  pinned: Option<RecordId>,
  form: RecordForm,
  /// Record to move the selection to once it shows up in a reload
  select_on_reload: Option<RecordId>,

  /// Set when a page fetch fails; replaces the card list
  load_error: Option<String>,
  status: Option<String>,

  event_tx: mpsc::UnboundedSender<Event>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, services: Services) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();

    Self {
      config,
      sync: services.sync,
      factory: services.factory,
      created: Some(services.created),
      records: Vec::new(),
      selected: 0,
      mode: Mode::Normal,
      command_input: TextInput::new(),
      selected_command: 0,
      search: SearchInput::new(),
      pinned: None,
      form: RecordForm::new(),
      select_on_reload: None,
      load_error: None,
      status: None,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    self.start_reload_listener();
    self.load_initial_data();

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn start_reload_listener(&mut self) {
    let Some(created) = self.created.take() else {
      return;
    };
    let tx = self.event_tx.clone();

    self.sync.spawn_reload_listener(created, move |result| {
      let event = match result {
        Ok(records) => CatalogEvent::Reloaded(records),
        Err(e) => CatalogEvent::ReloadFailed(e.to_string()),
      };
      let _ = tx.send(Event::Catalog(event));
    });
  }

  /// Show the cache right away; only an empty cache goes to the network
  fn load_initial_data(&mut self) {
    match self.sync.reload_all() {
      Ok(records) if !records.is_empty() => {
        info!(count = records.len(), "Showing cached catalog");
        self.status = Some(format!("{} beers from local cache", records.len()));
        self.set_records(records);
        self.sync.resume_after(1);
      }
      Ok(_) => self.spawn_load(1),
      Err(e) => {
        warn!(error = %e, "Could not read local cache");
        self.spawn_load(1);
      }
    }
  }

  fn spawn_load(&self, page: u32) {
    let sync = Arc::clone(&self.sync);
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let event = match sync.load_page(page).await {
        Ok(LoadOutcome::Loaded { page, records }) => CatalogEvent::PageLoaded { page, records },
        Ok(LoadOutcome::Exhausted { page }) => CatalogEvent::Exhausted { page },
        // A newer request owns the result
        Ok(LoadOutcome::Superseded { .. }) => return,
        Err(e) => CatalogEvent::LoadFailed {
          page,
          message: e.to_string(),
        },
      };
      let _ = tx.send(Event::Catalog(event));
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {} // UI refresh happens automatically
      Event::Catalog(event) => self.handle_catalog_event(event),
    }
  }

  fn handle_catalog_event(&mut self, event: CatalogEvent) {
    match event {
      CatalogEvent::PageLoaded { page, records } => {
        self.load_error = None;
        self.status = Some(format!("Loaded page {}", page));
        self.set_records(records);
      }
      CatalogEvent::Exhausted { page } => {
        debug!(page, "No more pages");
        self.status = Some("All beers loaded".to_string());
      }
      CatalogEvent::LoadFailed { page, message } => {
        self.status = Some(format!("Page {} failed", page));
        self.load_error = Some(message);
      }
      CatalogEvent::Reloaded(records) => self.set_records(records),
      CatalogEvent::ReloadFailed(message) => {
        self.status = Some(format!("Reload failed: {}", message));
      }
    }
  }

  fn set_records(&mut self, records: Vec<Record>) {
    self.records = records;

    if let Some(id) = self.pinned {
      if !self.records.iter().any(|r| r.id == id) {
        self.pinned = None;
      }
    }

    // The created record is committed before any reload that follows, so the
    // first reload settles the request whether or not the record is visible
    if let Some(id) = self.select_on_reload.take() {
      if let Some(index) = self.visible().iter().position(|r| r.id == id) {
        self.selected = index;
      }
    }

    self.clamp_selection();
  }

  fn handle_key(&mut self, key: KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_key(key),
      Mode::Command => self.handle_command_key(key),
      Mode::Form => self.handle_form_key(key),
    }
  }

  fn handle_normal_key(&mut self, key: KeyEvent) {
    // The search box gets first look, including the `/` that opens it
    let suggestion_count = self.suggestions().len();
    match self.search.handle_key(key, suggestion_count) {
      KeyResult::Handled => return,
      KeyResult::Event(event) => {
        self.handle_search_event(event);
        return;
      }
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }
      KeyCode::Char('q') => self.should_quit = true,

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
      KeyCode::End | KeyCode::Char('G') => {
        self.selected = self.visible().len().saturating_sub(1);
      }

      // Actions
      KeyCode::Char('n') | KeyCode::Char(' ') => self.load_more(),
      KeyCode::Char('a') => self.open_form(),
      KeyCode::Char('r') => self.reload_from_store(),
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
        self.selected_command = 0;
      }
      KeyCode::Esc => {
        self.search.set_query("");
        self.pinned = None;
        self.clamp_selection();
      }
      _ => {}
    }
  }

  fn handle_search_event(&mut self, event: SearchEvent) {
    match event {
      SearchEvent::Changed(_) => {
        self.pinned = None;
        self.selected = 0;
      }
      SearchEvent::Picked(index) => {
        let picked = self
          .suggestions()
          .get(index)
          .map(|record| (record.id, record.name.clone()));
        if let Some((id, name)) = picked {
          self.pinned = Some(id);
          self.search.set_query(&name);
          self.selected = 0;
        }
      }
      SearchEvent::Submitted => self.clamp_selection(),
    }
  }

  fn handle_command_key(&mut self, key: KeyEvent) {
    let count = self.command_suggestions().len();
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        if count > 0 {
          self.selected_command = (self.selected_command + 1) % count;
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        if count > 0 {
          self.selected_command = (self.selected_command + count - 1) % count;
        }
      }
      _ => match self.command_input.handle_key(key) {
        InputResult::Submitted(_) => self.execute_command(),
        InputResult::Cancelled => {
          self.mode = Mode::Normal;
          self.command_input.clear();
          self.selected_command = 0;
        }
        // Reset selection on input change
        InputResult::Consumed => self.selected_command = 0,
        InputResult::NotHandled => {}
      },
    }
  }

  fn execute_command(&mut self) {
    // Either the highlighted suggestion or what was typed
    let cmd = self
      .command_suggestions()
      .get(self.selected_command)
      .map(|c| c.name.to_string())
      .unwrap_or_else(|| self.command_input.value().trim().to_lowercase());

    self.mode = Mode::Normal;
    self.command_input.clear();
    self.selected_command = 0;

    match cmd.as_str() {
      "more" => self.load_more(),
      "new" => self.open_form(),
      "reload" => self.reload_from_store(),
      "reset" => self.reset_catalog(),
      "quit" => self.should_quit = true,
      other => self.status = Some(format!("Unknown command: {}", other)),
    }
  }

  fn handle_form_key(&mut self, key: KeyEvent) {
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Cancel) => self.mode = Mode::Normal,
      KeyResult::Event(FormEvent::Submit(values)) => self.submit_form(values),
      KeyResult::Handled | KeyResult::NotHandled => {}
    }
  }

  fn open_form(&mut self) {
    self.form = RecordForm::new();
    self.mode = Mode::Form;
  }

  fn submit_form(&mut self, values: FormValues) {
    let strength = match parse_strength(&values.strength) {
      Ok(strength) => strength,
      Err(e) => {
        self.form.set_error(e.to_string());
        return;
      }
    };

    let draft = RecordDraft::new(values.name, values.description, strength);
    match self.factory.create(draft) {
      Ok(record) => {
        // The list refreshes when the reload listener reports back
        self.status = Some(format!("Added {} (#{})", record.name, record.id));
        self.select_on_reload = Some(record.id);
        self.pinned = None;
        self.mode = Mode::Normal;
      }
      Err(e) => self.form.set_error(e.to_string()),
    }
  }

  fn load_more(&mut self) {
    let state = self.sync.state();
    match state.next_page() {
      Some(page) => self.spawn_load(page),
      None if state.is_exhausted() => {
        self.status = Some("All beers loaded".to_string());
      }
      None => {} // already loading
    }
  }

  fn reload_from_store(&mut self) {
    match self.sync.reload_all() {
      Ok(records) => {
        self.load_error = None;
        self.status = Some(format!("{} beers from local cache", records.len()));
        self.set_records(records);
      }
      Err(e) => self.status = Some(format!("Reload failed: {}", e)),
    }
  }

  fn reset_catalog(&mut self) {
    match self.sync.reset() {
      Ok(()) => {
        self.records.clear();
        self.pinned = None;
        self.search.set_query("");
        self.selected = 0;
        self.load_error = None;
        self.status = Some("Local cache cleared".to_string());
        self.spawn_load(1);
      }
      Err(e) => self.status = Some(format!("Reset failed: {}", e)),
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.visible().len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  fn clamp_selection(&mut self) {
    let len = self.visible().len();
    self.selected = self.selected.min(len.saturating_sub(1));
  }

  // Accessors for UI rendering

  pub fn records(&self) -> &[Record] {
    &self.records
  }

  fn projection(&self) -> Projection<'_> {
    projection::project(
      &self.records,
      self.search.query(),
      self.config.search.suggestion_limit,
    )
  }

  /// Records shown in the list: the pinned one, or the current search matches
  pub fn visible(&self) -> Vec<&Record> {
    if let Some(id) = self.pinned {
      return self.records.iter().filter(|r| r.id == id).collect();
    }
    self.projection().visible
  }

  pub fn suggestions(&self) -> Vec<&Record> {
    self.projection().suggestions
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }

  pub fn search(&self) -> &SearchInput {
    &self.search
  }

  pub fn form(&self) -> &RecordForm {
    &self.form
  }

  pub fn command_input(&self) -> &TextInput {
    &self.command_input
  }

  pub fn command_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(self.command_input.value())
  }

  pub fn selected_command(&self) -> usize {
    self.selected_command
  }

  pub fn load_error(&self) -> Option<&str> {
    self.load_error.as_deref()
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  pub fn page_state(&self) -> PageState {
    self.sync.state()
  }

  pub fn catalog_url(&self) -> &str {
    &self.config.catalog.url
  }

  pub fn image_base_url(&self) -> String {
    self.config.catalog.image_base_url()
  }

  pub fn excerpt_len(&self) -> usize {
    self.config.search.excerpt_len
  }

  pub fn is_persistent(&self) -> bool {
    self.sync.store().is_persistent()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn remote(id: RecordId, name: &str) -> Record {
    Record {
      id,
      name: name.to_string(),
      description: String::new(),
      strength: 5.0,
      image_ref: String::new(),
      tagline: String::new(),
      created_date: String::new(),
      is_user_created: false,
    }
  }

  /// App over an in-memory store, never touching the network
  fn app_with(records: Vec<Record>) -> App {
    let mut config = Config::default();
    config.store.enabled = false;
    config.catalog.url = "http://127.0.0.1:9".to_string();
    config.search.suggestion_limit = 2;

    let services = Services::connect(&config).unwrap();
    services.sync.store().upsert_all(&records).unwrap();
    let mut app = App::new(config, services);
    app.reload_from_store();
    app
  }

  fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
  }

  fn type_str(app: &mut App, s: &str) {
    for c in s.chars() {
      press(app, KeyCode::Char(c));
    }
  }

  fn visible_ids(app: &App) -> Vec<RecordId> {
    app.visible().iter().map(|r| r.id).collect()
  }

  #[test]
  fn test_search_filters_list() {
    let mut app = app_with(vec![
      remote(2, "Stout"),
      remote(1, "Punk IPA"),
      remote(3, "Hazy IPA"),
    ]);
    assert_eq!(visible_ids(&app), vec![1, 2, 3]);

    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "ipa");
    assert_eq!(visible_ids(&app), vec![1, 3]);
    assert_eq!(app.suggestions().len(), 2);

    // Esc inside the box clears the query
    press(&mut app, KeyCode::Esc);
    assert_eq!(visible_ids(&app), vec![1, 2, 3]);
  }

  #[test]
  fn test_suggestions_are_capped() {
    let mut app = app_with(vec![
      remote(1, "Punk IPA"),
      remote(2, "Punk IPA 2007"),
      remote(3, "Punk IPA 2010"),
    ]);
    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "punk");

    assert_eq!(app.suggestions().len(), 2);
    assert_eq!(app.visible().len(), 3);
  }

  #[test]
  fn test_picking_a_suggestion_pins_it() {
    let mut app = app_with(vec![remote(1, "Punk IPA"), remote(2, "Hazy IPA")]);

    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "ipa");
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);

    assert_eq!(visible_ids(&app), vec![2]);
    assert_eq!(app.search().query(), "Hazy IPA");

    // Esc in normal mode drops the pin and the query
    press(&mut app, KeyCode::Esc);
    assert_eq!(visible_ids(&app), vec![1, 2]);
  }

  #[test]
  fn test_navigation_wraps() {
    let mut app = app_with(vec![remote(1, "a"), remote(2, "b"), remote(3, "c")]);
    press(&mut app, KeyCode::Char('k'));
    assert_eq!(app.selected(), 2);
    press(&mut app, KeyCode::Char('j'));
    assert_eq!(app.selected(), 0);
    press(&mut app, KeyCode::Char('G'));
    assert_eq!(app.selected(), 2);
  }

  #[test]
  fn test_add_record_through_form() {
    let mut app = app_with((1..=5).map(|i| remote(i, "Remote")).collect());

    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.mode(), Mode::Form);
    type_str(&mut app, "House Saison");
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "Peppery");
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "6,2");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode(), Mode::Normal);
    assert_eq!(app.status(), Some("Added House Saison (#6)"));

    // What the reload listener would deliver
    let reloaded = app.sync.reload_all().unwrap();
    app.handle_catalog_event(CatalogEvent::Reloaded(reloaded));

    assert_eq!(app.records().len(), 6);
    assert_eq!(app.records().last().unwrap().name, "House Saison");
    assert_eq!(app.selected(), 5);
  }

  #[test]
  fn test_hidden_new_record_does_not_move_later_selection() {
    let mut app = app_with(vec![remote(1, "Punk IPA"), remote(2, "Hazy IPA")]);

    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "ipa");
    press(&mut app, KeyCode::Enter);

    press(&mut app, KeyCode::Char('a'));
    type_str(&mut app, "Stout");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "5");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.status(), Some("Added Stout (#3)"));

    // The search hides the new record
    let reloaded = app.sync.reload_all().unwrap();
    app.handle_catalog_event(CatalogEvent::Reloaded(reloaded));
    assert_eq!(app.selected(), 0);

    // Clearing the search and reloading later leaves the selection alone
    press(&mut app, KeyCode::Esc);
    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Char('r'));
    assert_eq!(visible_ids(&app), vec![1, 2, 3]);
    assert_eq!(app.selected(), 1);
  }

  #[test]
  fn test_form_rejects_bad_strength() {
    let mut app = app_with(Vec::new());

    press(&mut app, KeyCode::Char('a'));
    type_str(&mut app, "Mystery");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    type_str(&mut app, "strong");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode(), Mode::Form);
    assert!(app.sync.reload_all().unwrap().is_empty());
  }

  #[test]
  fn test_exhausted_keeps_records() {
    let mut app = app_with(vec![remote(1, "a"), remote(2, "b")]);

    app.handle_catalog_event(CatalogEvent::Exhausted { page: 2 });

    assert_eq!(app.records().len(), 2);
    assert_eq!(app.status(), Some("All beers loaded"));
  }

  #[test]
  fn test_load_failure_shows_error_until_reload() {
    let mut app = app_with(vec![remote(1, "a")]);

    app.handle_catalog_event(CatalogEvent::LoadFailed {
      page: 2,
      message: "Network error".to_string(),
    });
    assert_eq!(app.load_error(), Some("Network error"));

    press(&mut app, KeyCode::Char('r'));
    assert_eq!(app.load_error(), None);
    assert_eq!(app.records().len(), 1);
  }

  #[test]
  fn test_command_palette_opens_form() {
    let mut app = app_with(Vec::new());

    press(&mut app, KeyCode::Char(':'));
    assert_eq!(app.mode(), Mode::Command);
    type_str(&mut app, "add");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode(), Mode::Form);
  }

  #[test]
  fn test_unknown_command() {
    let mut app = app_with(Vec::new());

    press(&mut app, KeyCode::Char(':'));
    type_str(&mut app, "zzz");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode(), Mode::Normal);
    assert_eq!(app.status(), Some("Unknown command: zzz"));
  }
}
