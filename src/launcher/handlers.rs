//! Turn a launcher query into result items.

use chrono::NaiveDateTime;

use super::action::Action;
use super::items::ResultItem;
use super::session::{DataState, Session, stale_reason};
use super::{LauncherError, strip_keyword};
use crate::api::ApiError;
use crate::config::Preferences;
use crate::core::containers::{ContainerKind, group_tasks_by_list, matches_list_name};
use crate::core::dummy::{DEFAULT_DUMMY_TASK_COUNT, DEFAULT_DUMMY_TITLE_PREFIX};
use crate::core::filters::{DueFilter, get_due_filter_suggestions, rewrite_due_filter_query};
use crate::core::format::{format_for_display, format_subtitle, get_priority_label};
use crate::core::query::{CreateTaskParse, ListQuery, QueryCommand, parse_command, rewrite_create_due};
use crate::core::search::narrow_tasks;
use crate::core::task::Task;

const JOURNAL_HINT: &str = "journalctl --user -t morgen-tasks -f";
const CREATE_USAGE: &str = "new <title> [@due] [!priority]";

/// Per-query values every renderer needs.
struct QueryContext {
    keyword: String,
    /// The query with the keyword removed.
    query: String,
    now: NaiveDateTime,
}

impl QueryContext {
    fn fill(&self, rest: &str) -> String {
        format!("{} {}", self.keyword, rest)
    }

    /// Re-fill the current query, leaving the launcher where it is.
    fn stay(&self) -> String {
        self.fill(&self.query)
    }
}

pub fn handle_query(session: &mut Session, raw_query: &str) -> Result<Vec<ResultItem>, LauncherError> {
    session.reload_preferences();

    let keyword = session.prefs().keyword().to_string();
    let query = strip_keyword(raw_query, &keyword).to_string();
    log::debug!("Query: {:?}", query);

    if session.prefs().api_key().is_none() {
        return Ok(vec![welcome_item()]);
    }

    let ctx = QueryContext {
        keyword,
        query,
        now: session.now(),
    };

    match parse_command(&ctx.query, &session.date_parser(), ctx.now) {
        QueryCommand::Help => Ok(help_items(&ctx, session.prefs().dev_tools)),
        QueryCommand::Debug => Ok(debug_items(session, &ctx)),
        QueryCommand::ClearCache => {
            session.cache_mut().invalidate();
            Ok(vec![
                ResultItem::new("Cache cleared", "The next search fetches fresh tasks from Morgen").fill(ctx.fill("")),
            ])
        }
        QueryCommand::DevTools => Ok(dev_tools_items(session.prefs(), &ctx)),
        QueryCommand::ListContainers { kind, filter } => match load(session, false)? {
            Loaded::Ready(state) => Ok(container_items(session, &ctx, kind, &filter, &state)),
            Loaded::Failed(item) => Ok(vec![item]),
        },
        QueryCommand::CreateTask(parse) => Ok(create_items(session, &ctx, parse)),
        QueryCommand::Done(list_query) => match load(session, list_query.force_refresh)? {
            Loaded::Ready(state) => Ok(done_items(session, &ctx, &list_query, &state)),
            Loaded::Failed(item) => Ok(vec![item]),
        },
        QueryCommand::List(list_query) => match load(session, list_query.force_refresh)? {
            Loaded::Ready(state) => Ok(list_items(session, &ctx, &list_query, &state)),
            Loaded::Failed(item) => Ok(vec![item]),
        },
    }
}

enum Loaded {
    Ready(DataState),
    Failed(ResultItem),
}

/// API failures become a single explanatory item; anything else propagates.
fn load(session: &mut Session, force_refresh: bool) -> Result<Loaded, LauncherError> {
    match session.ensure_tasks(force_refresh) {
        Ok(state) => Ok(Loaded::Ready(state)),
        Err(LauncherError::Api(e)) => {
            log::error!("Failed to load tasks: {}", e);
            Ok(Loaded::Failed(api_error_item(&e)))
        }
        Err(e) => Err(e),
    }
}

pub fn api_error_item(error: &ApiError) -> ResultItem {
    match error {
        ApiError::Auth { .. } => ResultItem::new("Authentication Failed", error.to_string()),
        e if e.is_transient() => ResultItem::new(
            format!("{}: no cached data available", stale_reason(e)),
            e.to_string(),
        ),
        e => ResultItem::new("Morgen API Error", e.to_string()),
    }
}

fn welcome_item() -> ResultItem {
    let location = Preferences::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "config.json".to_string());
    ResultItem::new(
        "Welcome to Morgen Tasks",
        format!("Set \"api_key\" in {} or export MORGEN_API_KEY", location),
    )
}

fn help_items(ctx: &QueryContext, dev_tools: bool) -> Vec<ResultItem> {
    let kw = &ctx.keyword;
    let mut entries = vec![
        (format!("{} <search>", kw), "Search tasks by title and description", ""),
        (
            format!("{} new Buy milk @tomorrow !high", kw),
            "Create a task (@due: today, tomorrow, next-mon, 15:30, 2026-02-10; !priority: !, !!, !1-9, !low)",
            "new ",
        ),
        (format!("{} done <search>", kw), "Complete a task", "done "),
        (format!("{} lists", kw), "Browse lists, projects and spaces", "lists"),
        (format!("{} in <name> <search>", kw), "Tasks in one list, project or space", "in "),
        (
            format!("{} p:high due:today", kw),
            "Filter by priority (high, medium, low, normal, 1-9) and due date (today, tomorrow, overdue, future, week, next-month, nodue)",
            "due:",
        ),
        (format!("{} !", kw), "Refresh tasks from Morgen", "!"),
        (format!("{} clear", kw), "Clear the task cache", "clear"),
        (format!("{} debug", kw), "Cache and logging diagnostics", "debug"),
    ];
    if dev_tools {
        entries.push((format!("{} dev", kw), "Developer tools", "dev"));
    }
    entries
        .into_iter()
        .map(|(name, description, completion)| ResultItem::new(name, description).fill(ctx.fill(completion)))
        .collect()
}

fn debug_items(session: &Session, ctx: &QueryContext) -> Vec<ResultItem> {
    let cache = session.cache();
    let prefs = session.prefs();
    vec![
        ResultItem::new(
            format!("Cache: {}", cache.get_age_display()),
            format!("{} tasks cached, TTL {}s", cache.task_count(), cache.ttl()),
        )
        .fill(ctx.fill("!")),
        ResultItem::new(
            format!("Newest task update: {}", cache.get_last_updated().unwrap_or("none")),
            "Most recent updated timestamp among cached tasks",
        )
        .fill(ctx.stay()),
        ResultItem::new(
            "Cache file",
            cache
                .cache_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "in memory only".to_string()),
        )
        .fill(ctx.stay()),
        ResultItem::new(
            format!("Debug logging: {}", if crate::debug_logging() { "on" } else { "off" }),
            format!("View logs with: {}", JOURNAL_HINT),
        )
        .fill(ctx.stay()),
        ResultItem::new(
            format!("Keyword: {}", prefs.keyword()),
            format!(
                "Max results {}, default due time {}",
                prefs.max_results(),
                session.date_parser().default_time().format("%H:%M")
            ),
        )
        .fill(ctx.stay()),
    ]
}

fn dev_tools_items(prefs: &Preferences, ctx: &QueryContext) -> Vec<ResultItem> {
    if !prefs.dev_tools {
        return vec![
            ResultItem::new("Developer tools are disabled", "Set \"dev_tools\": true in config.json to enable them")
                .fill(ctx.stay()),
        ];
    }
    vec![
        ResultItem::new(
            format!("Create {} dummy tasks", DEFAULT_DUMMY_TASK_COUNT),
            format!("Titles start with \"{}\"", DEFAULT_DUMMY_TITLE_PREFIX),
        )
        .run(Action::CreateDummyTasks {
            count: DEFAULT_DUMMY_TASK_COUNT,
            title_prefix: DEFAULT_DUMMY_TITLE_PREFIX.to_string(),
        }),
        ResultItem::new(
            "Complete dummy tasks",
            format!("Closes every task whose title starts with \"{}\"", DEFAULT_DUMMY_TITLE_PREFIX),
        )
        .run(Action::CompleteDummyTasks {
            title_prefix: DEFAULT_DUMMY_TITLE_PREFIX.to_string(),
        }),
        ResultItem::new("Dump task fields", "List every field present in the task payload").run(Action::DumpTaskFields),
    ]
}

fn cached_tasks(session: &Session) -> &[Task] {
    session
        .cache()
        .get_full_response()
        .map(|r| r.tasks())
        .unwrap_or(&[])
}

fn stale_header(state: &DataState, count: usize) -> Option<ResultItem> {
    match state {
        DataState::Fresh => None,
        DataState::Stale { reason } => Some(ResultItem::new(
            format!("{} — showing cached data", reason),
            format!("{} from the last successful fetch", plural(count, "task")),
        )),
    }
}

fn list_items(session: &Session, ctx: &QueryContext, query: &ListQuery, state: &DataState) -> Vec<ResultItem> {
    let tasks = cached_tasks(session);
    let maps = session.cache().get_container_name_maps();
    let matches = narrow_tasks(tasks, query, &maps, ctx.now);
    let max = session.prefs().max_results();

    let narrowed = query.container.is_some() || query.filters.is_active() || !query.search.is_empty();
    let header = stale_header(state, matches.len()).unwrap_or_else(|| {
        let name = if narrowed {
            format!("{} matching", plural(matches.len(), "task"))
        } else {
            plural(matches.len(), "task")
        };
        ResultItem::new(
            name,
            format!("Cache: {} · Enter to refresh", session.cache().get_age_display()),
        )
        .fill(ctx.fill("!"))
    });
    let mut items = vec![header];
    items.extend(due_suggestion_items(ctx, query));

    if matches.is_empty() {
        items.push(
            ResultItem::new("No tasks found", format!("Try another search, or '{} !' to refresh", ctx.keyword))
                .fill(ctx.stay()),
        );
        return items;
    }

    for task in matches.iter().take(max) {
        items.push(ResultItem::new(
            format_for_display(task, ctx.now),
            format_subtitle(task, ctx.now),
        ));
    }
    if matches.len() > max {
        items.push(
            ResultItem::new(format!("… and {} more", matches.len() - max), "Refine your search to see more")
                .fill(ctx.stay()),
        );
    }
    items
}

/// `due:<value>` completions while a trailing `due:` token is being typed.
fn due_suggestion_items(ctx: &QueryContext, query: &ListQuery) -> Vec<ResultItem> {
    let Some(fragment) = &query.due_fragment else {
        return Vec::new();
    };
    get_due_filter_suggestions(fragment, DueFilter::ALL.len())
        .into_iter()
        .map(|value| {
            ResultItem::new(format!("due:{}", value), "Filter by due date")
                .fill(ctx.fill(&rewrite_due_filter_query(&ctx.query, value)))
        })
        .collect()
}

fn done_items(session: &Session, ctx: &QueryContext, query: &ListQuery, state: &DataState) -> Vec<ResultItem> {
    let tasks = cached_tasks(session);
    let maps = session.cache().get_container_name_maps();
    let matches: Vec<&Task> = narrow_tasks(tasks, query, &maps, ctx.now)
        .into_iter()
        .filter(|t| !t.id.is_empty())
        .collect();
    let max = session.prefs().max_results();

    let mut items: Vec<ResultItem> = stale_header(state, matches.len()).into_iter().collect();
    items.extend(due_suggestion_items(ctx, query));
    if matches.is_empty() {
        items.push(ResultItem::new("No matching tasks to complete", "Type part of a task title").fill(ctx.stay()));
        return items;
    }
    for task in matches.iter().take(max) {
        items.push(
            ResultItem::new(
                format!("Complete: {}", format_for_display(task, ctx.now)),
                format_subtitle(task, ctx.now),
            )
            .run(Action::CompleteTask {
                id: task.id.clone(),
                title: task.display_title().to_string(),
            }),
        );
    }
    if matches.len() > max {
        items.push(
            ResultItem::new(format!("… and {} more", matches.len() - max), "Refine your search to see more")
                .fill(ctx.stay()),
        );
    }
    items
}

fn container_items(
    session: &Session,
    ctx: &QueryContext,
    kind: Option<ContainerKind>,
    filter: &str,
    state: &DataState,
) -> Vec<ResultItem> {
    let tasks = cached_tasks(session);
    let maps = session.cache().get_container_name_maps();
    let groups: Vec<_> = group_tasks_by_list(tasks, &maps)
        .into_iter()
        .filter(|(r, _)| kind.is_none_or(|k| r.kind == Some(k)))
        .filter(|(r, _)| filter.is_empty() || matches_list_name(r.display_name(), filter))
        .collect();

    let mut items: Vec<ResultItem> = stale_header(state, tasks.len()).into_iter().collect();
    if groups.is_empty() {
        let what = kind.map_or("lists", |k| match k {
            ContainerKind::List => "lists",
            ContainerKind::Project => "projects",
            ContainerKind::Space => "spaces",
        });
        items.push(
            ResultItem::new(format!("No {} found", what), "Tasks carry no list, project or space information")
                .fill(ctx.stay()),
        );
        return items;
    }

    let max = session.prefs().max_results();
    for (list_ref, count) in groups.iter().take(max) {
        let label = list_ref.kind.map_or("List", |k| k.label());
        items.push(
            ResultItem::new(
                format!("{}: {}", label, list_ref.display_name()),
                format!("{} · Enter to show", plural(*count, "task")),
            )
            .run(Action::ShowList {
                kind: list_ref.kind,
                list_id: list_ref.list_id.clone(),
                name: list_ref.name.clone(),
            }),
        );
    }
    if groups.len() > max {
        items.push(
            ResultItem::new(format!("… and {} more", groups.len() - max), "Type part of a name to narrow down")
                .fill(ctx.stay()),
        );
    }
    items
}

fn create_items(session: &Session, ctx: &QueryContext, parse: CreateTaskParse) -> Vec<ResultItem> {
    match parse {
        CreateTaskParse::Ready(args) => {
            let due = args
                .due
                .as_ref()
                .map_or_else(|| "No due date".to_string(), |d| format!("Due: {}", d.display));
            vec![
                ResultItem::new(
                    format!("Create task: {}", args.title),
                    format!("{} | Priority: {}", due, get_priority_label(Some(args.priority))),
                )
                .run(Action::CreateTask {
                    title: args.title,
                    description: None,
                    due: args.due.map(|d| d.due),
                    priority: args.priority,
                }),
            ]
        }
        CreateTaskParse::IncompleteDue {
            title, suggestions, ..
        } => {
            let parser = session.date_parser();
            suggestions
                .into_iter()
                .map(|value| {
                    let when = parser
                        .parse(value, ctx.now)
                        .map(|d| d.display)
                        .unwrap_or_else(|_| value.to_string());
                    ResultItem::new(format!("@{}", value), format!("Due {} · create \"{}\"", when, title))
                        .fill(ctx.fill(&rewrite_create_due(&ctx.query, value)))
                })
                .collect()
        }
        CreateTaskParse::Invalid(e) => vec![
            ResultItem::new("Cannot create task", format!("{}. Usage: {} {}", e, ctx.keyword, CREATE_USAGE))
                .fill(ctx.stay()),
        ],
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
