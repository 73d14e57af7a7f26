//! The launcher query grammar.
//!
//! ```text
//! help | ? | h                      usage
//! debug | log | logs                diagnostics
//! clear | reset | cache-clear       drop the task cache
//! dev | dev-tools                   developer actions
//! new|add <title> [@due] [!prio]    create a task
//! lists | ls | projects | spaces    list containers
//! d|done [query]                    complete a task
//! ! | refresh                       force a refetch
//! in <name> [query]                 tasks in a container
//! list|project|space <name> [query] tasks in a container of that kind
//! list|project|space id:<id> [...]  tasks in exactly that container
//! [p:high] [due:today] [text...]    filter and search
//! ```

use chrono::NaiveDateTime;

use super::containers::ContainerKind;
use super::date_parser::{DateParseError, DateParser, ParsedDue, suggest_due_shorthands};
use super::filters::{TaskFilterSpec, extract_due_filter_fragment, parse_query_filters};

const DUE_SUGGESTION_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryCommand {
    Help,
    Debug,
    ClearCache,
    DevTools,
    /// Container overview, optionally limited to one kind and a name filter.
    ListContainers {
        kind: Option<ContainerKind>,
        filter: String,
    },
    CreateTask(CreateTaskParse),
    /// Pick a task to complete.
    Done(ListQuery),
    List(ListQuery),
}

/// Restrict results to a container by name (substring) or id (exact).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFilter {
    pub kind: Option<ContainerKind>,
    pub value: String,
    /// Written as `id:<id>`; only the container id is compared.
    pub by_id: bool,
}

/// Everything the default list/search flow needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    /// One-shot refetch, only set by an exact `!`/`refresh` query.
    pub force_refresh: bool,
    pub container: Option<ContainerFilter>,
    /// Partial trailing `due:` token being typed, for autocompletion.
    pub due_fragment: Option<String>,
    pub filters: TaskFilterSpec,
    pub search: String,
}

/// Parse a raw (keyword-stripped) launcher query.
pub fn parse_command(raw: &str, parser: &DateParser, now: NaiveDateTime) -> QueryCommand {
    let query = raw.trim();
    if query.is_empty() {
        return QueryCommand::List(ListQuery::default());
    }

    let lower = query.to_lowercase();
    match lower.as_str() {
        "help" | "?" | "h" => return QueryCommand::Help,
        "debug" | "log" | "logs" => return QueryCommand::Debug,
        "clear" | "reset" | "cache-clear" | "cacheclear" => return QueryCommand::ClearCache,
        "dev" | "dev-tools" | "devtools" => return QueryCommand::DevTools,
        _ => {}
    }

    let (head, rest) = split_first_word(query);
    let head_lower = head.to_lowercase();
    match head_lower.as_str() {
        "new" | "add" => {
            return QueryCommand::CreateTask(parse_create_args(rest, parser, now));
        }
        "lists" | "ls" => {
            return QueryCommand::ListContainers {
                kind: None,
                filter: rest.trim().to_string(),
            };
        }
        "projects" | "spaces" => {
            return QueryCommand::ListContainers {
                kind: ContainerKind::from_keyword(&head_lower),
                filter: rest.trim().to_string(),
            };
        }
        "list" | "project" | "space" if rest.trim().is_empty() => {
            return QueryCommand::ListContainers {
                kind: ContainerKind::from_keyword(&head_lower),
                filter: String::new(),
            };
        }
        "d" | "done" => return QueryCommand::Done(parse_list_query(rest)),
        _ => {}
    }

    QueryCommand::List(parse_list_query(query))
}

/// Refresh marker, container filter, structured filters and search text.
pub fn parse_list_query(query: &str) -> ListQuery {
    let mut out = ListQuery::default();
    let mut query = query.trim();

    let (head, rest) = split_first_word(query);
    if head == "!" || head.eq_ignore_ascii_case("refresh") {
        if rest.trim().is_empty() {
            out.force_refresh = true;
        }
        // Text typed after the marker is a search, not another refresh.
        query = rest.trim();
    }

    let (container, residual) = extract_container_filter(query);
    out.container = container;

    out.due_fragment = extract_due_filter_fragment(&residual);
    let (filters, mut search) = parse_query_filters(&residual);
    if out.due_fragment.is_some() {
        search = drop_last_word(&search);
    }
    out.filters = filters;
    out.search = search;
    out
}

/// `in <name> [query]` or `list|project|space <name> [query]`. Names may be
/// double-quoted to include spaces.
fn extract_container_filter(query: &str) -> (Option<ContainerFilter>, String) {
    let (head, rest) = split_first_word(query);
    let head_lower = head.to_lowercase();
    let kind = match head_lower.as_str() {
        "in" => None,
        other => match ContainerKind::from_keyword(other) {
            Some(kind) if !other.ends_with('s') => Some(kind),
            _ => return (None, query.to_string()),
        },
    };

    let Some((name, residual)) = take_name(rest) else {
        return (None, query.to_string());
    };
    let filter = match name.strip_prefix("id:").map(str::trim) {
        Some(id) if !id.is_empty() => ContainerFilter {
            kind,
            value: id.to_string(),
            by_id: true,
        },
        _ => ContainerFilter {
            kind,
            value: name,
            by_id: false,
        },
    };
    (Some(filter), residual)
}

fn take_name(text: &str) -> Option<(String, String)> {
    let text = text.trim_start();
    if let Some(quoted) = text.strip_prefix('"') {
        let (name, rest) = match quoted.find('"') {
            Some(end) => (&quoted[..end], &quoted[end + 1..]),
            None => (quoted, ""),
        };
        let name = name.trim();
        return (!name.is_empty()).then(|| (name.to_string(), rest.trim().to_string()));
    }
    let (name, rest) = split_first_word(text);
    (!name.is_empty()).then(|| (name.to_string(), rest.trim().to_string()))
}

fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    }
}

fn drop_last_word(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    words.pop();
    words.join(" ")
}

/// Arguments for a task that can be created as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskArgs {
    pub title: String,
    pub due: Option<ParsedDue>,
    pub priority: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateTaskParse {
    Ready(CreateTaskArgs),
    /// The `@due` token is empty or unparseable but shorthands still match
    /// what was typed, so the caller can offer a pick-list.
    IncompleteDue {
        title: String,
        priority: i64,
        partial: String,
        suggestions: Vec<&'static str>,
    },
    Invalid(CreateTaskError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateTaskError {
    #[error("Task title is required")]
    EmptyTitle,
    #[error("Unknown priority: {0}")]
    UnknownPriority(String),
    #[error("Invalid due date '{token}': {source}")]
    InvalidDue {
        token: String,
        #[source]
        source: DateParseError,
    },
}

/// Parse `new`/`add` arguments: `Buy milk @tomorrow !high`.
///
/// - first `@token` is the due date
/// - `!`, `!!`, `!<1-9>` or `!<name>` set the priority; a lone `--` means low
/// - everything else is the title, with surrounding quotes stripped
pub fn parse_create_args(args: &str, parser: &DateParser, now: NaiveDateTime) -> CreateTaskParse {
    let mut title_tokens: Vec<&str> = Vec::new();
    let mut due_token: Option<&str> = None;
    let mut priority: i64 = 0;

    for token in args.split_whitespace() {
        if token.starts_with('@') && due_token.is_none() {
            due_token = Some(&token[1..]);
            continue;
        }
        if token == "--" {
            priority = 9;
            continue;
        }
        if let Some(spec) = token.strip_prefix('!') {
            match parse_priority_token(spec) {
                Ok(p) => priority = p,
                Err(e) => return CreateTaskParse::Invalid(e),
            }
            continue;
        }
        title_tokens.push(token);
    }

    let title = strip_matching_quotes(&title_tokens.join(" ")).trim().to_string();
    if title.is_empty() {
        return CreateTaskParse::Invalid(CreateTaskError::EmptyTitle);
    }

    let Some(token) = due_token else {
        return CreateTaskParse::Ready(CreateTaskArgs {
            title,
            due: None,
            priority,
        });
    };

    if token.is_empty() {
        return CreateTaskParse::IncompleteDue {
            title,
            priority,
            partial: String::new(),
            suggestions: suggest_due_shorthands("", DUE_SUGGESTION_LIMIT),
        };
    }

    match parser.parse(token, now) {
        Ok(due) => CreateTaskParse::Ready(CreateTaskArgs {
            title,
            due: Some(due),
            priority,
        }),
        Err(source) => {
            let suggestions = suggest_due_shorthands(token, DUE_SUGGESTION_LIMIT);
            if suggestions.is_empty() {
                CreateTaskParse::Invalid(CreateTaskError::InvalidDue {
                    token: token.to_string(),
                    source,
                })
            } else {
                CreateTaskParse::IncompleteDue {
                    title,
                    priority,
                    partial: token.to_string(),
                    suggestions,
                }
            }
        }
    }
}

/// Priority after the leading `!` has been removed.
fn parse_priority_token(spec: &str) -> Result<i64, CreateTaskError> {
    let lower = spec.to_lowercase();
    match lower.as_str() {
        "" => return Ok(5),
        "!" => return Ok(1),
        "high" | "hi" | "h" | "urgent" => return Ok(1),
        "medium" | "med" | "m" | "normal" => return Ok(5),
        "low" | "lo" | "l" => return Ok(9),
        _ => {}
    }
    if lower.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(p) = lower.parse::<i64>() {
            if (1..=9).contains(&p) {
                return Ok(p);
            }
        }
    }
    Err(CreateTaskError::UnknownPriority(format!("!{}", spec)))
}

fn strip_matching_quotes(text: &str) -> &str {
    let text = text.trim();
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Replace the first `@token` of a create query with `@<chosen>`, appending
/// one when absent.
pub fn rewrite_create_due(raw_query: &str, chosen: &str) -> String {
    let replacement = format!("@{}", chosen);
    let mut tokens: Vec<&str> = raw_query.split_whitespace().collect();
    match tokens.iter().position(|t| t.starts_with('@')) {
        Some(i) => tokens[i] = &replacement,
        None => tokens.push(&replacement),
    }
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::DueFilter;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 6)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn parse(raw: &str) -> QueryCommand {
        parse_command(raw, &DateParser::default(), now())
    }

    fn list(raw: &str) -> ListQuery {
        match parse(raw) {
            QueryCommand::List(q) => q,
            other => panic!("expected list query, got {:?}", other),
        }
    }

    fn create(raw: &str) -> CreateTaskParse {
        parse_create_args(raw, &DateParser::default(), now())
    }

    #[test]
    fn empty_query_lists_everything() {
        assert_eq!(parse("   "), QueryCommand::List(ListQuery::default()));
    }

    #[test]
    fn exact_commands_win_over_search() {
        assert_eq!(parse("help"), QueryCommand::Help);
        assert_eq!(parse("?"), QueryCommand::Help);
        assert_eq!(parse("LOGS"), QueryCommand::Debug);
        assert_eq!(parse("cache-clear"), QueryCommand::ClearCache);
        assert_eq!(parse("dev"), QueryCommand::DevTools);
        assert_eq!(list("help me").search, "help me");
    }

    #[test]
    fn container_listing_commands() {
        assert_eq!(
            parse("lists"),
            QueryCommand::ListContainers {
                kind: None,
                filter: String::new()
            }
        );
        assert_eq!(
            parse("projects wo"),
            QueryCommand::ListContainers {
                kind: Some(ContainerKind::Project),
                filter: "wo".to_string()
            }
        );
        assert_eq!(
            parse("space"),
            QueryCommand::ListContainers {
                kind: Some(ContainerKind::Space),
                filter: String::new()
            }
        );
    }

    #[test]
    fn refresh_marker_is_one_shot() {
        let q = list("!");
        assert!(q.force_refresh);
        assert_eq!(q.search, "");

        let q = list("refresh");
        assert!(q.force_refresh);

        let q = list("! report");
        assert!(!q.force_refresh);
        assert_eq!(q.search, "report");
    }

    #[test]
    fn container_filters() {
        let q = list("in work report p:high");
        assert_eq!(
            q.container,
            Some(ContainerFilter {
                kind: None,
                value: "work".to_string(),
                by_id: false,
            })
        );
        assert_eq!(q.search, "report");
        assert_eq!(q.filters.priority_values.len(), 1);

        let q = list("project \"Holiday Planning\" flights");
        assert_eq!(
            q.container,
            Some(ContainerFilter {
                kind: Some(ContainerKind::Project),
                value: "Holiday Planning".to_string(),
                by_id: false,
            })
        );
        assert_eq!(q.search, "flights");

        let q = list("list id:l1 report");
        assert_eq!(
            q.container,
            Some(ContainerFilter {
                kind: Some(ContainerKind::List),
                value: "l1".to_string(),
                by_id: true,
            })
        );
        assert_eq!(q.search, "report");

        let q = list("in \"id:int 7\"");
        assert_eq!(q.container.as_ref().map(|c| (c.value.as_str(), c.by_id)), Some(("int 7", true)));

        let q = list("in");
        assert_eq!(q.container, None);
        assert_eq!(q.search, "in");
    }

    #[test]
    fn structured_filters_and_due_fragment() {
        let q = list("report due:today");
        assert_eq!(q.filters.due_values.iter().copied().collect::<Vec<_>>(), vec![DueFilter::Today]);
        assert_eq!(q.due_fragment, None);
        assert_eq!(q.search, "report");

        let q = list("report due:to");
        assert_eq!(q.due_fragment.as_deref(), Some("to"));
        assert_eq!(q.search, "report");
    }

    #[test]
    fn done_mode_parses_remaining_query() {
        match parse("done p:high invoice") {
            QueryCommand::Done(q) => {
                assert_eq!(q.search, "invoice");
                assert!(q.filters.is_active());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse("d"), QueryCommand::Done(q) if q.search.is_empty()));
    }

    #[test]
    fn create_with_due_and_priority() {
        match create("Buy milk @tomorrow !high") {
            CreateTaskParse::Ready(args) => {
                assert_eq!(args.title, "Buy milk");
                assert_eq!(args.priority, 1);
                assert_eq!(args.due.unwrap().due, "2026-02-07T09:00:00");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn create_priority_shortcuts() {
        let priority = |raw: &str| match create(raw) {
            CreateTaskParse::Ready(args) => args.priority,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(priority("task !"), 5);
        assert_eq!(priority("task !!"), 1);
        assert_eq!(priority("task !3"), 3);
        assert_eq!(priority("task !lo"), 9);
        assert_eq!(priority("task --"), 9);
        assert_eq!(priority("task"), 0);
    }

    #[test]
    fn create_rejects_bad_priority_and_empty_title() {
        assert_eq!(
            create("task !0"),
            CreateTaskParse::Invalid(CreateTaskError::UnknownPriority("!0".to_string()))
        );
        assert_eq!(
            create("task !whenever"),
            CreateTaskParse::Invalid(CreateTaskError::UnknownPriority("!whenever".to_string()))
        );
        assert_eq!(create("@today !high"), CreateTaskParse::Invalid(CreateTaskError::EmptyTitle));
        assert_eq!(create("\"\""), CreateTaskParse::Invalid(CreateTaskError::EmptyTitle));
    }

    #[test]
    fn create_strips_quotes_and_uses_first_at_token() {
        match create("Email @bob about lunch @today") {
            CreateTaskParse::Invalid(CreateTaskError::InvalidDue { token, .. }) => {
                assert_eq!(token, "bob");
            }
            other => panic!("unexpected {:?}", other),
        }
        match create("'Call mom' @today") {
            CreateTaskParse::Ready(args) => {
                assert_eq!(args.title, "Call mom");
                assert_eq!(args.due.unwrap().due, "2026-02-06T09:00:00");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn incomplete_due_offers_suggestions() {
        match create("Buy milk @") {
            CreateTaskParse::IncompleteDue { partial, suggestions, .. } => {
                assert_eq!(partial, "");
                assert_eq!(suggestions.len(), DUE_SUGGESTION_LIMIT);
            }
            other => panic!("unexpected {:?}", other),
        }
        match create("Buy milk @to") {
            CreateTaskParse::IncompleteDue { partial, suggestions, .. } => {
                assert_eq!(partial, "to");
                assert_eq!(suggestions, vec!["today", "tomorrow"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            create("Buy milk @blah"),
            CreateTaskParse::Invalid(CreateTaskError::InvalidDue { .. })
        ));
    }

    #[test]
    fn rewrite_create_due_token() {
        assert_eq!(rewrite_create_due("new Buy milk @to !high", "today"), "new Buy milk @today !high");
        assert_eq!(rewrite_create_due("new Buy milk", "noon"), "new Buy milk @noon");
    }
}
