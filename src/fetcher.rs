use std::future::Future;

use spdlog::warn;

use crate::api::{BlogSource, Error};
use crate::model::{BlogRecord, Category};
use crate::notice::Notice;

/// Route-derived parameters that select what a view shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchParams {
    All,
    Category(String),
    Search(String),
    Slug(String),
}

impl FetchParams {
    /// Issues the read request matching these parameters.
    ///
    /// Categories outside the fixed set and blank searches come back empty
    /// without touching the network.
    pub async fn fetch_list<B: BlogSource + ?Sized>(&self, source: &B) -> Result<Vec<BlogRecord>, Error> {
        match self {
            FetchParams::All => source.list_blogs().await,
            FetchParams::Category(category) => match Category::parse(category) {
                Some(category) => source.blogs_by_category(category.slug()).await,
                None => Ok(vec![]),
            },
            FetchParams::Search(query) if query.trim().is_empty() => Ok(vec![]),
            FetchParams::Search(query) => source.search_blogs(query.trim()).await,
            FetchParams::Slug(slug) => Ok(source.blog_by_slug(slug).await?.into_iter().collect()),
        }
    }

    pub async fn fetch_one<B: BlogSource + ?Sized>(&self, source: &B) -> Result<Option<BlogRecord>, Error> {
        match self {
            FetchParams::Slug(slug) => source.blog_by_slug(slug).await,
            other => Ok(other.fetch_list(source).await?.into_iter().next()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Empty,
    Populated(T),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ViewState::Empty)
    }

    pub fn populated(&self) -> Option<&T> {
        match self {
            ViewState::Populated(value) => Some(value),
            _ => None,
        }
    }
}

/// What a fetch returned, reduced to "nothing" or a value to show.
pub trait Payload<T> {
    fn into_payload(self) -> Option<T>;
}

impl<X> Payload<Vec<X>> for Vec<X> {
    fn into_payload(self) -> Option<Vec<X>> {
        if self.is_empty() { None } else { Some(self) }
    }
}

impl<X> Payload<X> for Option<X> {
    fn into_payload(self) -> Option<X> {
        self
    }
}

/// Proof that a request was dispatched for a given parameter snapshot.
#[derive(Debug)]
pub struct Ticket<P> {
    seq: u64,
    params: P,
}

impl<P> Ticket<P> {
    pub fn params(&self) -> &P {
        &self.params
    }
}

/// Fetch-on-parameter-change state holder for one view.
///
/// Every dispatched request is tagged with the parameters that triggered it;
/// a response is only applied when it still matches the latest request, so a
/// slow answer for old parameters can't overwrite a newer one.
pub struct ResourceFetcher<P, T> {
    current: Option<P>,
    seq: u64,
    state: ViewState<T>,
    notice: Option<Notice>,
    failure_message: String,
}

impl<P: Clone + PartialEq, T> ResourceFetcher<P, T> {
    pub fn new(failure_message: &str) -> Self {
        ResourceFetcher {
            current: None,
            seq: 0,
            state: ViewState::Loading,
            notice: None,
            failure_message: failure_message.to_string(),
        }
    }

    /// Starts a request when the parameters changed. Returns `None` when the
    /// view already asked for exactly these parameters.
    pub fn request(&mut self, params: P) -> Option<Ticket<P>> {
        if self.current.as_ref() == Some(&params) {
            return None;
        }

        self.seq += 1;
        self.current = Some(params.clone());
        self.state = ViewState::Loading;
        Some(Ticket { seq: self.seq, params })
    }

    /// Applies a response. Returns `false` when the ticket is stale and the
    /// response was discarded.
    pub fn resolve<R: Payload<T>>(&mut self, ticket: Ticket<P>, result: Result<R, Error>) -> bool {
        if ticket.seq != self.seq || self.current.as_ref() != Some(&ticket.params) {
            return false;
        }

        self.state = match result {
            Ok(payload) => match payload.into_payload() {
                Some(value) => ViewState::Populated(value),
                None => ViewState::Empty,
            },
            Err(e) => {
                warn!("{}: {}", self.failure_message, e);
                self.notice = Some(Notice::error(self.failure_message.as_str()));
                ViewState::Empty
            }
        };
        true
    }

    /// Requests and resolves in one go, for callers that wait on the answer.
    pub async fn load<F, Fut, R>(&mut self, params: P, fetch: F) -> &ViewState<T>
    where
        F: FnOnce(P) -> Fut,
        Fut: Future<Output = Result<R, Error>>,
        R: Payload<T>,
    {
        if let Some(ticket) = self.request(params) {
            let result = fetch(ticket.params().clone()).await;
            self.resolve(ticket, result);
        }
        &self.state
    }

    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    pub fn into_state(self) -> ViewState<T> {
        self.state
    }

    pub fn current(&self) -> Option<&P> {
        self.current.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    fn blog(slug: &str, category: &str) -> BlogRecord {
        BlogRecord {
            id: format!("id-{}", slug),
            slug: slug.to_string(),
            title: slug.to_uppercase(),
            description: String::new(),
            content: String::new(),
            category: category.to_string(),
            price: None,
            affiliate_link: None,
            tags: vec![],
            image: None,
            created_at: None,
        }
    }

    struct FakeSource {
        blogs: Vec<BlogRecord>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(blogs: Vec<BlogRecord>) -> Self {
            FakeSource { blogs, calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BlogSource for FakeSource {
        async fn list_blogs(&self) -> Result<Vec<BlogRecord>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.blogs.clone())
        }

        async fn blogs_by_category(&self, category_slug: &str) -> Result<Vec<BlogRecord>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.blogs.iter()
                .filter(|b| Category::parse(&b.category).map(|c| c.slug()) == Some(category_slug))
                .cloned()
                .collect())
        }

        async fn search_blogs(&self, query: &str) -> Result<Vec<BlogRecord>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let query = query.to_lowercase();
            Ok(self.blogs.iter().filter(|b| b.slug.contains(&query)).cloned().collect())
        }

        async fn blog_by_slug(&self, slug: &str) -> Result<Option<BlogRecord>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.blogs.iter().find(|b| b.slug == slug).cloned())
        }
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut fetcher: ResourceFetcher<FetchParams, Vec<BlogRecord>> = ResourceFetcher::new("Error fetching blogs");
        let first = fetcher.request(FetchParams::Category("gaming".to_string())).unwrap();
        let second = fetcher.request(FetchParams::Category("fashion".to_string())).unwrap();

        // The newer request answers first
        assert!(fetcher.resolve(second, Ok(vec![blog("jacket", "Fashion")])));
        assert!(!fetcher.resolve(first, Ok(vec![blog("console", "Gaming")])));

        let shown = fetcher.state().populated().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].slug, "jacket");
    }

    #[test]
    fn same_params_do_not_retrigger() {
        let mut fetcher: ResourceFetcher<FetchParams, Vec<BlogRecord>> = ResourceFetcher::new("Error fetching blogs");
        assert!(fetcher.request(FetchParams::All).is_some());
        assert!(fetcher.request(FetchParams::All).is_none());
        assert!(fetcher.state().is_loading());
    }

    #[test]
    fn failure_is_empty_with_notice() {
        let mut fetcher: ResourceFetcher<FetchParams, Vec<BlogRecord>> = ResourceFetcher::new("Error fetching blogs");
        let ticket = fetcher.request(FetchParams::All).unwrap();
        fetcher.resolve::<Vec<BlogRecord>>(ticket, Err(Error::Connection("refused".to_string())));

        assert!(fetcher.state().is_empty());
        assert_eq!(fetcher.take_notice(), Some(Notice::error("Error fetching blogs")));
        assert_eq!(fetcher.take_notice(), None);
    }

    #[tokio::test]
    async fn unknown_category_is_empty_without_network() {
        let source = FakeSource::new(vec![blog("console", "Gaming")]);
        let mut fetcher: ResourceFetcher<FetchParams, Vec<BlogRecord>> = ResourceFetcher::new("Error fetching blogs");

        let src = &source;
        let state = fetcher
            .load(FetchParams::Category("toasters".to_string()), |p| async move { p.fetch_list(src).await })
            .await;
        assert!(state.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn known_category_populates() {
        let source = FakeSource::new(vec![blog("console", "Gaming"), blog("fridge", "Home Appliances")]);
        let mut fetcher: ResourceFetcher<FetchParams, Vec<BlogRecord>> = ResourceFetcher::new("Error fetching blogs");

        let src = &source;
        let state = fetcher
            .load(FetchParams::Category("home-appliances".to_string()), |p| async move { p.fetch_list(src).await })
            .await;
        let blogs = state.populated().unwrap();
        assert_eq!(blogs.len(), 1);
        assert_eq!(blogs[0].slug, "fridge");
    }

    #[tokio::test]
    async fn repeated_search_is_idempotent() {
        let source = FakeSource::new(vec![blog("phone-a", "Mobiles"), blog("phone-b", "Mobiles"), blog("tv", "Electronics")]);
        let params = FetchParams::Search("phone".to_string());

        let first = params.fetch_list(&source).await.unwrap();
        let second = params.fetch_list(&source).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn blank_search_skips_network() {
        let source = FakeSource::new(vec![blog("phone-a", "Mobiles")]);
        let blogs = FetchParams::Search("   ".to_string()).fetch_list(&source).await.unwrap();
        assert!(blogs.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn detail_missing_is_empty() {
        let source = FakeSource::new(vec![blog("phone-a", "Mobiles")]);
        let mut fetcher: ResourceFetcher<FetchParams, BlogRecord> = ResourceFetcher::new("Error fetching blog");

        let src = &source;
        let state = fetcher
            .load(FetchParams::Slug("nope".to_string()), |p| async move { p.fetch_one(src).await })
            .await;
        assert!(state.is_empty());

        let state = fetcher
            .load(FetchParams::Slug("phone-a".to_string()), |p| async move { p.fetch_one(src).await })
            .await;
        assert_eq!(state.populated().map(|b| b.slug.as_str()), Some("phone-a"));
    }
}
