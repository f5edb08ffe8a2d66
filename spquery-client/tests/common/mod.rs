#![allow(dead_code)]

use serde_json::{json, Value};
use spquery_client::{ClientConfig, ClientContext, List, QueryOutcome, Result, ResultSink};
use spquery_transport::ScriptedTransport;
use std::sync::{Arc, Mutex};

pub const SITE: &str = "https://contoso.sharepoint.com";

pub fn context() -> (ClientContext, Arc<ScriptedTransport>) {
    context_with(ClientConfig::new(SITE))
}

pub fn context_with(config: ClientConfig) -> (ClientContext, Arc<ScriptedTransport>) {
    spquery_client::logging::init_test_logging();
    let transport = Arc::new(ScriptedTransport::new());
    (ClientContext::new(config, transport.clone()), transport)
}

pub fn docs(ctx: &ClientContext) -> List {
    ctx.web().get_list_by_title("Docs")
}

pub fn api(path: &str) -> String {
    format!("{}/_api/{}", SITE, path)
}

pub fn verbose(entity: Value) -> Value {
    json!({ "d": entity })
}

pub fn verbose_results(records: Value) -> Value {
    json!({ "d": { "results": records } })
}

/// Shared log of `(label, outcome)` pairs in delivery order.
#[derive(Clone, Default)]
pub struct OutcomeLog {
    entries: Arc<Mutex<Vec<(String, QueryOutcome)>>>,
}

impl OutcomeLog {
    pub fn sink(&self, label: &str) -> Arc<dyn ResultSink> {
        Arc::new(LabelledSink {
            label: label.to_string(),
            log: self.clone(),
        })
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn outcome(&self, label: &str) -> Option<QueryOutcome> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, o)| o.clone())
    }
}

struct LabelledSink {
    label: String,
    log: OutcomeLog,
}

impl ResultSink for LabelledSink {
    fn complete(&self, outcome: &QueryOutcome) -> Result<()> {
        self.log
            .entries
            .lock()
            .unwrap()
            .push((self.label.clone(), outcome.clone()));
        Ok(())
    }
}
