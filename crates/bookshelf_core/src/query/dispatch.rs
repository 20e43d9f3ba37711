//! Registry that routes named operations to handlers.

use super::handlers::{QueryHandler, SearchBooksByTitle, SearchGenresByTerm};
use super::{CatalogReader, QueryOutput, QueryRequest};
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("operation name must not be blank")]
    BlankOperation,
    #[error("operation `{0}` already has a handler")]
    DuplicateOperation(String),
}

#[derive(Default)]
pub struct QueryDispatcher {
    handlers: BTreeMap<String, Arc<dyn QueryHandler>>,
}

impl QueryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with both catalog searches registered.
    pub fn with_default_handlers(genre_limit: usize) -> Self {
        let mut handlers: BTreeMap<String, Arc<dyn QueryHandler>> = BTreeMap::new();
        let defaults: [Arc<dyn QueryHandler>; 2] = [
            Arc::new(SearchBooksByTitle),
            Arc::new(SearchGenresByTerm::new(genre_limit)),
        ];
        for handler in defaults {
            handlers.insert(handler.operation_name().to_string(), handler);
        }
        Self { handlers }
    }

    pub fn register(&mut self, handler: Arc<dyn QueryHandler>) -> Result<(), DispatchError> {
        let name = handler.operation_name().trim();
        if name.is_empty() {
            return Err(DispatchError::BlankOperation);
        }
        if self.handlers.contains_key(name) {
            return Err(DispatchError::DuplicateOperation(name.to_string()));
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(())
    }

    pub fn operation_names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Routes a request to its named handler, or lists the collection.
    pub fn dispatch(&self, reader: &dyn CatalogReader, request: &QueryRequest) -> QueryOutput {
        let started_at = Instant::now();
        let custom = request
            .operation_name()
            .and_then(|name| self.handlers.get(name))
            .and_then(|handler| handler.handle(reader, request));

        let (route, output) = match custom {
            Some(output) => ("custom", output),
            None => (
                "generic",
                QueryOutput::Collection(reader.list_collection(request.resource())),
            ),
        };
        debug!(
            "event=query_dispatch module=query status=ok route={route} resource={} operation={} results={} duration_ms={}",
            request.resource(),
            request.operation_name().unwrap_or("-"),
            output.len(),
            started_at.elapsed().as_millis()
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::{DispatchError, QueryDispatcher};
    use crate::query::{
        CatalogReader, QueryHandler, QueryOutput, QueryRequest, SearchBooksByTitle,
    };
    use crate::graph::EntityGraph;
    use crate::model::EntityKind;
    use std::sync::Arc;

    struct Blank;

    impl QueryHandler for Blank {
        fn operation_name(&self) -> &str {
            "  "
        }

        fn handle(&self, _: &dyn CatalogReader, _: &QueryRequest) -> Option<QueryOutput> {
            None
        }
    }

    #[test]
    fn duplicate_and_blank_names_are_rejected() {
        let mut dispatcher = QueryDispatcher::new();
        dispatcher.register(Arc::new(SearchBooksByTitle)).unwrap();

        assert_eq!(
            dispatcher.register(Arc::new(SearchBooksByTitle)),
            Err(DispatchError::DuplicateOperation("searchBooksByTitle".into()))
        );
        assert_eq!(
            dispatcher.register(Arc::new(Blank)),
            Err(DispatchError::BlankOperation)
        );
        assert_eq!(dispatcher.operation_names(), vec!["searchBooksByTitle"]);
    }

    #[test]
    fn unknown_operation_falls_through_to_listing() {
        let graph = EntityGraph::new();
        let dispatcher = QueryDispatcher::with_default_handlers(10);
        let request = QueryRequest::operation(EntityKind::Genre, "topRated");

        let output = dispatcher.dispatch(&graph, &request);
        assert_eq!(output, QueryOutput::Collection(Vec::new()));
    }
}
