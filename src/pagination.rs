use askama_actix::Template;
use sea_orm::{ConnectionTrait, DbErr, Paginator as DbPaginator, SelectorTrait};

const PAGINATOR_LOOK_AHEAD: usize = 2;

/// Page links around the current page, with the first and last page always shown.
///
/// [1] 2 3 ... 13
/// 1 2 [3] 4 5 ... 13
/// 1 2 3 4 [5] 6 7 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 9 10 [11] 12 13
/// 1 ... 11 12 [13]
#[derive(Clone, Debug)]
pub struct Paginator {
    pub base_url: String,
    pub this_page: usize,
    pub page_count: usize,
}

#[derive(Template)]
#[template(path = "util/paginator.html")]
struct PaginatorTemplate<'a> {
    paginator: &'a Paginator,
    links: Vec<Option<usize>>,
}

impl Paginator {
    pub fn has_pages(&self) -> bool {
        self.page_count > 1
    }

    pub fn has_previous(&self) -> bool {
        self.this_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.this_page < self.page_count
    }

    pub fn is_current(&self, page: &usize) -> bool {
        *page == self.this_page
    }

    pub fn url_for(&self, page: &usize) -> String {
        format!("{}?page={}", self.base_url, page)
    }

    pub fn previous_url(&self) -> String {
        self.url_for(&self.this_page.saturating_sub(1).max(1))
    }

    pub fn next_url(&self) -> String {
        self.url_for(&(self.this_page + 1).min(self.page_count))
    }

    /// Page numbers to link, in order. `None` marks a gap.
    pub fn get_links(&self) -> Vec<Option<usize>> {
        let mut links = Vec::new();
        if self.page_count == 0 {
            return links;
        }

        let lo = self.this_page.saturating_sub(PAGINATOR_LOOK_AHEAD).max(1);
        let hi = (self.this_page + PAGINATOR_LOOK_AHEAD).min(self.page_count);

        if lo > 1 {
            links.push(Some(1));
            // A gap of exactly one page is rendered as that page.
            if lo > 3 {
                links.push(None);
            } else if lo == 3 {
                links.push(Some(2));
            }
        }
        links.extend((lo..=hi).map(Some));
        if hi < self.page_count {
            if hi + 2 < self.page_count {
                links.push(None);
            } else if hi + 2 == self.page_count {
                links.push(Some(hi + 1));
            }
            links.push(Some(self.page_count));
        }
        links
    }

    pub fn as_html(&self) -> String {
        if !self.has_pages() {
            return String::new();
        }

        let template = PaginatorTemplate {
            paginator: self,
            links: self.get_links(),
        };
        match template.render() {
            Ok(html) => html,
            Err(e) => {
                log::error!("Paginator::as_html: {}", e);
                "[Paginator Error]".to_owned()
            }
        }
    }
}

/// One page of results, with enough information to render its paginator.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub num_items: usize,
    pub paginator: Paginator,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Turns the raw `?page=` value into a 1-based page number.
/// Garbage gives the first page, anything past the end gives the last one.
pub fn resolve_page_number(requested: Option<&str>, num_pages: usize) -> usize {
    let num_pages = num_pages.max(1);
    match requested.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(n)) if n < 1 => num_pages,
        Some(Ok(n)) => (n as usize).min(num_pages),
        _ => 1,
    }
}

/// Fetches the requested page from a database paginator.
pub async fn fetch_page<'db, C, S>(
    paginator: DbPaginator<'db, C, S>,
    requested: Option<&str>,
    base_url: String,
) -> Result<Page<S::Item>, DbErr>
where
    C: ConnectionTrait,
    S: SelectorTrait + 'db,
{
    let num_items = paginator.num_items().await?;
    let num_pages = paginator.num_pages().await?.max(1);
    let number = resolve_page_number(requested, num_pages);
    let items = paginator.fetch_page(number - 1).await?;

    Ok(Page {
        items,
        number,
        num_pages,
        num_items,
        paginator: Paginator {
            base_url,
            this_page: number,
            page_count: num_pages,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(this_page: usize, page_count: usize) -> Vec<Option<usize>> {
        Paginator {
            base_url: "/".to_owned(),
            this_page,
            page_count,
        }
        .get_links()
    }

    #[test]
    fn page_number_defaults_to_first() {
        assert_eq!(resolve_page_number(None, 3), 1);
        assert_eq!(resolve_page_number(Some("abc"), 3), 1);
        assert_eq!(resolve_page_number(Some(""), 3), 1);
    }

    #[test]
    fn page_number_out_of_range_gives_last() {
        assert_eq!(resolve_page_number(Some("2"), 2), 2);
        assert_eq!(resolve_page_number(Some("9"), 2), 2);
        assert_eq!(resolve_page_number(Some("0"), 2), 2);
        assert_eq!(resolve_page_number(Some("-4"), 2), 2);
    }

    #[test]
    fn empty_listing_still_has_one_page() {
        assert_eq!(resolve_page_number(Some("5"), 0), 1);
    }

    #[test]
    fn links_near_start() {
        assert_eq!(
            links(1, 13),
            vec![Some(1), Some(2), Some(3), None, Some(13)]
        );
        assert_eq!(
            links(3, 13),
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), None, Some(13)]
        );
    }

    #[test]
    fn links_in_the_middle() {
        assert_eq!(
            links(6, 13),
            vec![Some(1), None, Some(4), Some(5), Some(6), Some(7), Some(8), None, Some(13)]
        );
    }

    #[test]
    fn links_near_end() {
        assert_eq!(
            links(13, 13),
            vec![Some(1), None, Some(11), Some(12), Some(13)]
        );
        assert_eq!(
            links(11, 13),
            vec![Some(1), None, Some(9), Some(10), Some(11), Some(12), Some(13)]
        );
    }

    #[test]
    fn single_gap_page_is_shown() {
        assert_eq!(
            links(5, 8),
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), Some(6), Some(7), Some(8)]
        );
    }

    #[test]
    fn single_page_renders_nothing() {
        let paginator = Paginator {
            base_url: "/".to_owned(),
            this_page: 1,
            page_count: 1,
        };
        assert!(!paginator.has_pages());
        assert_eq!(paginator.as_html(), "");
    }
}
