use std::fmt;

use url::Url;

use crate::error::ImportError;

const DEFAULT_GID: &str = "0";

/// A spreadsheet link reduced to the pieces needed to request its CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetUrl {
    origin: Url,
    document_id: String,
    gid: String,
}

impl SheetUrl {
    pub fn parse(input: &str) -> Result<Self, ImportError> {
        let invalid = || ImportError::InvalidUrlFormat(input.trim().to_owned());

        let url = Url::parse(input.trim()).map_err(|_| invalid())?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid());
        }
        if url.host_str().is_none() {
            return Err(invalid());
        }

        let document_id = document_id_from_path(url.path()).ok_or_else(invalid)?;
        let gid = gid_from_fragment(url.fragment())
            .or_else(|| gid_from_query(&url))
            .unwrap_or_else(|| DEFAULT_GID.to_owned());

        let mut origin = url.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        Ok(Self {
            origin,
            document_id,
            gid,
        })
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn gid(&self) -> &str {
        &self.gid
    }

    /// The URL that returns the tab as raw CSV text.
    pub fn export_url(&self) -> Url {
        let mut export = self.origin.clone();
        export.set_path(&format!("/spreadsheets/d/{}/export", self.document_id));
        export
            .query_pairs_mut()
            .append_pair("format", "csv")
            .append_pair("gid", &self.gid);
        export
    }
}

impl fmt::Display for SheetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.export_url())
    }
}

fn document_id_from_path(path: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment != "spreadsheets" {
            continue;
        }
        if segments.next() != Some("d") {
            return None;
        }
        let id = segments.next()?;
        let valid = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        return valid.then(|| id.to_owned());
    }
    None
}

fn gid_from_fragment(fragment: Option<&str>) -> Option<String> {
    fragment?
        .split('&')
        .find_map(|pair| pair.strip_prefix("gid="))
        .filter(|gid| is_gid(gid))
        .map(ToOwned::to_owned)
}

fn gid_from_query(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "gid")
        .map(|(_, value)| value.into_owned())
        .filter(|gid| is_gid(gid))
}

fn is_gid(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_edit_link_with_fragment_gid() -> anyhow::Result<()> {
        let sheet = SheetUrl::parse(
            "https://docs.google.com/spreadsheets/d/1AbC-d_9/edit?usp=sharing#gid=123456",
        )?;
        assert_eq!(sheet.document_id(), "1AbC-d_9");
        assert_eq!(sheet.gid(), "123456");
        assert_eq!(
            sheet.export_url().as_str(),
            "https://docs.google.com/spreadsheets/d/1AbC-d_9/export?format=csv&gid=123456"
        );
        Ok(())
    }

    #[test]
    fn defaults_to_first_tab() -> anyhow::Result<()> {
        let sheet = SheetUrl::parse("https://docs.google.com/spreadsheets/d/abc/edit")?;
        assert_eq!(sheet.gid(), "0");
        Ok(())
    }

    #[test]
    fn reads_gid_from_query_when_fragment_missing() -> anyhow::Result<()> {
        let sheet = SheetUrl::parse("https://docs.google.com/spreadsheets/d/abc/edit?gid=42")?;
        assert_eq!(sheet.gid(), "42");
        Ok(())
    }

    #[test]
    fn keeps_origin_port_for_local_hosts() -> anyhow::Result<()> {
        let sheet = SheetUrl::parse("http://127.0.0.1:8080/spreadsheets/d/xyz/edit#gid=7")?;
        assert_eq!(
            sheet.export_url().as_str(),
            "http://127.0.0.1:8080/spreadsheets/d/xyz/export?format=csv&gid=7"
        );
        Ok(())
    }

    #[test]
    fn rejects_links_without_document_path() {
        for input in [
            "not a url",
            "ftp://docs.google.com/spreadsheets/d/abc",
            "https://docs.google.com/document/d/abc/edit",
            "https://docs.google.com/spreadsheets/abc",
            "https://docs.google.com/spreadsheets/d/",
        ] {
            assert!(
                matches!(SheetUrl::parse(input), Err(ImportError::InvalidUrlFormat(_))),
                "input={input}"
            );
        }
    }
}
