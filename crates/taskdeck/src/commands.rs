use std::sync::Arc;

use anyhow::{Result, bail};
use serde_json::json;
use taskdeck_app::{
    AppConfig, AsyncKeyValueStore, IdentityProvider, IdentityStore, MockIdentityProvider,
    ProfileForm, StoreFault, TelemetrySink, TodoEditForm, TodoForm, TodoStore,
};
use taskdeck_core::{
    Clock, DEFAULT_RECENT_LIMIT, DueStatus, Session, SystemClock, Todo, TodoId, TodoStats,
};
use time::format_description::well_known::Rfc3339;

use crate::{Command, LsFormat};

/// Both stores wired to one storage backend.
pub struct Workspace<S, P> {
    todos: TodoStore<S>,
    identity: IdentityStore<S, P>,
    clock: Arc<dyn Clock>,
}

impl<S: Clone> Workspace<S, MockIdentityProvider> {
    pub fn new(store: S, config: &AppConfig, telemetry: Arc<dyn TelemetrySink>) -> Self {
        let todos = TodoStore::new(store.clone())
            .with_key(config.storage.todos_key.clone())
            .with_telemetry(telemetry.clone());
        let identity = IdentityStore::new(store, MockIdentityProvider::new(config.identity.clone()))
            .with_key(config.storage.session_key.clone())
            .with_telemetry(telemetry);
        Self {
            todos,
            identity,
            clock: Arc::new(SystemClock),
        }
    }
}

impl<S, P> Workspace<S, P>
where
    S: AsyncKeyValueStore,
    P: IdentityProvider,
{
    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Add {
                title,
                description,
                due,
            } => {
                let input = TodoForm {
                    title,
                    description: description.unwrap_or_default(),
                    due,
                }
                .into_new_todo()?;
                self.load_todos_for_write().await?;
                let todo = self.todos.add(input).await;
                println!("created todo: {}", todo.id);
                self.warn_on_fault();
            }
            Command::Edit {
                id,
                title,
                description,
                due,
                clear_due,
            } => {
                let patch = TodoEditForm {
                    title,
                    description,
                    due,
                    clear_due,
                }
                .into_patch()?;
                if patch.is_empty() {
                    bail!("Nothing to update; pass --title, --description, --due or --clear-due");
                }
                self.load_todos_for_write().await?;
                let id = TodoId::from(id);
                let Some(todo) = self.todos.update(&id, patch).await else {
                    bail!("Todo not found: {id}");
                };
                println!("updated todo: {}", todo.id);
                self.warn_on_fault();
            }
            Command::Toggle { id } => {
                self.load_todos_for_write().await?;
                let id = TodoId::from(id);
                let Some(todo) = self.todos.toggle_status(&id).await else {
                    bail!("Todo not found: {id}");
                };
                println!("{}: {}", todo.id, todo.status);
                self.warn_on_fault();
            }
            Command::Rm { id } => {
                self.load_todos_for_write().await?;
                let id = TodoId::from(id);
                let Some(todo) = self.todos.delete(&id).await else {
                    bail!("Todo not found: {id}");
                };
                println!("deleted todo: {}", todo.id);
                self.warn_on_fault();
            }
            Command::Ls {
                filter,
                search,
                format,
            } => {
                self.todos.load().await;
                self.warn_on_fault();
                self.todos.set_filter(&filter);
                self.todos.set_search_query(search.unwrap_or_default());
                let todos = self.todos.query();
                match format {
                    LsFormat::Table if todos.is_empty() => {
                        if self.todos.is_narrowed() {
                            println!("No todos matched the provided filters");
                        } else {
                            println!("No todos found");
                        }
                    }
                    LsFormat::Table => print!("{}", render_todo_table(&todos, self.clock.now())),
                    LsFormat::Json => println!("{}", serde_json::to_string_pretty(&todos)?),
                }
            }
            Command::Stats { format } => {
                self.todos.load().await;
                self.warn_on_fault();
                let stats = self.todos.stats();
                let recent = self.todos.recent_completions(DEFAULT_RECENT_LIMIT);
                match format {
                    LsFormat::Table => print!("{}", render_stats(&stats, &recent)),
                    LsFormat::Json => {
                        let payload = json!({
                            "stats": stats,
                            "tier": stats.tier(),
                            "recentCompletions": recent,
                        });
                        println!("{}", serde_json::to_string_pretty(&payload)?);
                    }
                }
            }
            Command::Login { provider } => {
                let session = self.identity.login(provider).await?;
                println!("signed in as {}", describe_session(&session));
            }
            Command::Logout => {
                self.identity.load_session().await;
                let was_signed_in = self.identity.is_authenticated();
                self.identity.logout().await;
                if was_signed_in {
                    println!("signed out");
                } else {
                    println!("not signed in");
                }
            }
            Command::Whoami => {
                self.identity.load_session().await;
                match self.identity.session() {
                    Some(session) => println!("{}", describe_session(session)),
                    None => println!("not signed in"),
                }
            }
            Command::Profile { name, email } => {
                let patch = ProfileForm { name, email }.into_patch()?;
                self.identity.load_session().await;
                let session = self.identity.update_profile(patch).await?;
                println!("updated profile: {}", describe_session(&session));
            }
        }

        Ok(())
    }

    // Writing over a snapshot that failed to load would discard it.
    async fn load_todos_for_write(&mut self) -> Result<()> {
        self.todos.load().await;
        if let Some(fault @ StoreFault::LoadFailed) = self.todos.fault() {
            bail!("{fault}; refusing to overwrite the stored todos");
        }
        Ok(())
    }

    fn warn_on_fault(&self) {
        if let Some(fault) = self.todos.fault() {
            eprintln!("warning: {fault}");
        }
    }
}

fn describe_session(session: &Session) -> String {
    format!("{} <{}> ({})", session.name, session.email, session.provider)
}

fn render_todo_table(todos: &[Todo], now: time::OffsetDateTime) -> String {
    let mut out = String::from("ID | Status | Title | Due | Created\n-- | ------ | ----- | --- | -------\n");
    for todo in todos {
        let due = todo.due_date.map_or_else(
            || "-".to_owned(),
            |due| DueStatus::classify(due, now).to_string(),
        );
        let created = todo
            .created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_owned());
        out.push_str(&format!(
            "{} | {} | {} | {} | {}\n",
            todo.id, todo.status, todo.title, due, created
        ));
    }
    out
}

fn render_stats(stats: &TodoStats, recent: &[&Todo]) -> String {
    let mut out = format!(
        "Total: {}\nCompleted: {}\nOpen: {}\nOverdue: {}\nCompletion: {}% ({})\n",
        stats.total,
        stats.completed,
        stats.open,
        stats.overdue,
        stats.completion_rate,
        stats.tier()
    );
    if !recent.is_empty() {
        out.push_str("Recent completions:\n");
        for todo in recent {
            out.push_str(&format!("  - {} ({})\n", todo.title, todo.id));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_app::{IdentityConfig, MemoryStore, NoopTelemetry, SharedStore, shared};
    use taskdeck_core::{ManualClock, NewTodo, TodoStatus};
    use time::Duration;
    use time::macros::datetime;

    const NOW: time::OffsetDateTime = datetime!(2025-03-10 12:00 UTC);

    fn workspace(backend: &MemoryStore) -> Workspace<SharedStore<MemoryStore>, MockIdentityProvider> {
        let config = AppConfig {
            identity: IdentityConfig::instant(),
            ..AppConfig::default()
        };
        Workspace::new(shared(backend.clone()), &config, Arc::new(NoopTelemetry))
    }

    fn add(title: &str) -> Command {
        Command::Add {
            title: title.to_owned(),
            description: None,
            due: None,
        }
    }

    async fn run(ws: &mut Workspace<SharedStore<MemoryStore>, MockIdentityProvider>, command: Command) {
        ws.run(command)
            .await
            .unwrap_or_else(|err| panic!("command failed: {err:#}"));
    }

    #[tokio::test]
    async fn commands_persist_between_invocations() {
        let backend = MemoryStore::new();
        run(&mut workspace(&backend), add("Buy milk")).await;

        let mut second = workspace(&backend);
        run(&mut second, Command::Ls {
            filter: "all".into(),
            search: None,
            format: LsFormat::Json,
        })
        .await;
        assert_eq!(second.todos.len(), 1);

        let id = second.todos.todos()[0].id.to_string();
        run(&mut workspace(&backend), Command::Toggle { id: id.clone() }).await;

        let mut third = workspace(&backend);
        third.todos.load().await;
        assert_eq!(third.todos.todos()[0].status, TodoStatus::Complete);

        run(&mut third, Command::Rm { id }).await;
        assert!(third.todos.is_empty());
    }

    #[tokio::test]
    async fn add_rejects_blank_title() {
        let backend = MemoryStore::new();
        let result = workspace(&backend).run(add("   ")).await;
        assert!(result.is_err());
        assert_eq!(backend.peek("todos"), None);
    }

    #[tokio::test]
    async fn missing_id_is_an_error() {
        let mut ws = workspace(&MemoryStore::new());
        let err = ws
            .run(Command::Toggle { id: "nope".into() })
            .await
            .err()
            .unwrap_or_else(|| panic!("toggle of a missing id must fail"));
        assert!(err.to_string().contains("Todo not found"));
    }

    #[tokio::test]
    async fn edit_without_fields_is_rejected() {
        let mut ws = workspace(&MemoryStore::new());
        let result = ws
            .run(Command::Edit {
                id: "any".into(),
                title: None,
                description: None,
                due: None,
                clear_due: false,
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn corrupt_snapshot_blocks_writes() {
        let backend = MemoryStore::new().with_entry("todos", "{broken");
        let result = workspace(&backend).run(add("anything")).await;
        assert!(result.is_err());
        assert_eq!(backend.peek("todos").as_deref(), Some("{broken"));
    }

    #[tokio::test]
    async fn login_profile_logout_cycle() {
        let backend = MemoryStore::new();
        run(&mut workspace(&backend), Command::Login {
            provider: taskdeck_core::Provider::Demo,
        })
        .await;
        assert!(backend.peek("user").is_some());

        let mut ws = workspace(&backend);
        run(&mut ws, Command::Profile {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        })
        .await;
        assert_eq!(ws.identity.session().map(|s| s.name.as_str()), Some("Ada"));

        run(&mut workspace(&backend), Command::Logout).await;
        assert_eq!(backend.peek("user"), None);

        let result = workspace(&backend)
            .run(Command::Profile {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            })
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn table_shows_due_status() {
        let mut todo = Todo::create(
            NewTodo::new("Walk dog").with_due_date(NOW + Duration::hours(20)),
            datetime!(2025-03-09 08:00 UTC),
        );
        todo.id = TodoId::from("t1");
        let table = render_todo_table(&[todo], NOW);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID | Status | Title | Due | Created");
        assert_eq!(
            lines[2],
            "t1 | open | Walk dog | Due tomorrow | 2025-03-09T08:00:00Z"
        );
    }

    #[test]
    fn stats_render_rate_and_recent() {
        let clock = ManualClock::new(NOW);
        let mut done = Todo::create(NewTodo::new("Stretch"), clock.now());
        done.toggle(clock.now());
        let open = Todo::create(NewTodo::new("Read"), clock.now());
        let todos = vec![done, open];

        let stats = TodoStats::from_todos(&todos, NOW);
        let recent = taskdeck_core::recent_completions(&todos, DEFAULT_RECENT_LIMIT);
        let rendered = render_stats(&stats, &recent);

        assert!(rendered.contains("Completion: 50% (fair)"), "{rendered}");
        assert!(rendered.contains("  - Stretch ("), "{rendered}");
    }
}
