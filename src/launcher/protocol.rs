//! JSON-lines messages exchanged with the launcher host.
//!
//! Same shape as the COSMIC launcher plugin protocol: one request per stdin
//! line, one response per stdout line.

use serde::{Deserialize, Serialize};
use std::io::Write;

use super::LauncherError;

/// Index into the result list most recently sent to the host.
pub type Indice = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    Search(String),
    Activate(Indice),
    /// Tab completion on a result.
    Complete(Indice),
    Interrupt,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Indice,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Append(SearchResult),
    Clear,
    Close,
    Fill(String),
    Finished,
}

pub fn parse_request(line: &str) -> Result<Request, LauncherError> {
    Ok(serde_json::from_str(line.trim())?)
}

pub fn send<W: Write>(out: &mut W, response: &Response) -> Result<(), LauncherError> {
    let line = serde_json::to_string(response)?;
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_decode() {
        assert_eq!(parse_request(r#"{"Search": "mg report"}"#).unwrap(), Request::Search("mg report".into()));
        assert_eq!(parse_request(r#"{"Activate": 3}"#).unwrap(), Request::Activate(3));
        assert_eq!(parse_request(r#"{"Complete": 0}"#).unwrap(), Request::Complete(0));
        assert_eq!(parse_request("\"Interrupt\"\n").unwrap(), Request::Interrupt);
        assert_eq!(parse_request("\"Exit\"").unwrap(), Request::Exit);
        assert!(parse_request("{\"Quit\": 1}").is_err());
    }

    #[test]
    fn responses_encode_one_per_line() {
        let mut out = Vec::new();
        send(
            &mut out,
            &Response::Append(SearchResult {
                id: 0,
                name: "Pay rent".into(),
                description: "Due: Today 09:00".into(),
            }),
        )
        .unwrap();
        send(&mut out, &Response::Finished).unwrap();
        send(&mut out, &Response::Fill("mg done ".into())).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"Append":{"id":0,"name":"Pay rent","description":"Due: Today 09:00"}}"#,
                r#""Finished""#,
                r#"{"Fill":"mg done "}"#,
            ]
        );
    }
}
