use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;

use crate::profile::reader::{HttpReader, LocalReader, ProfileReader};
use crate::profile::writer::{LocalWriter, ReportWriter};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown profile reader: {0}")]
    UnknownReader(String),
    #[error("unknown report writer: {0}")]
    UnknownWriter(String),
}

/// Named reader and writer strategies. Lookups are case-insensitive.
#[derive(Clone)]
pub struct IoRegistry {
    readers: Vec<(String, Arc<dyn ProfileReader>)>,
    writers: Vec<(String, Arc<dyn ReportWriter>)>,
}

impl IoRegistry {
    pub fn empty() -> Self {
        Self {
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    pub fn local_only() -> Self {
        Self::empty()
            .with_reader("local", Arc::new(LocalReader))
            .with_writer("local", Arc::new(LocalWriter))
    }

    pub fn with_defaults(http_timeout: Duration) -> Result<Self> {
        let http: Arc<dyn ProfileReader> = Arc::new(HttpReader::new(http_timeout)?);
        Ok(Self::local_only()
            .with_reader("http", Arc::clone(&http))
            .with_reader("https", http))
    }

    pub fn with_reader(mut self, name: &str, reader: Arc<dyn ProfileReader>) -> Self {
        let key = normalize(name);
        self.readers.retain(|(existing, _)| *existing != key);
        self.readers.push((key, reader));
        self
    }

    pub fn with_writer(mut self, name: &str, writer: Arc<dyn ReportWriter>) -> Self {
        let key = normalize(name);
        self.writers.retain(|(existing, _)| *existing != key);
        self.writers.push((key, writer));
        self
    }

    pub fn reader(&self, name: &str) -> Result<Arc<dyn ProfileReader>, RegistryError> {
        let key = normalize(name);
        self.readers
            .iter()
            .find(|(registered, _)| *registered == key)
            .map(|(_, reader)| Arc::clone(reader))
            .ok_or_else(|| RegistryError::UnknownReader(name.to_string()))
    }

    pub fn writer(&self, name: &str) -> Result<Arc<dyn ReportWriter>, RegistryError> {
        let key = normalize(name);
        self.writers
            .iter()
            .find(|(registered, _)| *registered == key)
            .map(|(_, writer)| Arc::clone(writer))
            .ok_or_else(|| RegistryError::UnknownWriter(name.to_string()))
    }

    pub fn reader_names(&self) -> Vec<&str> {
        self.readers.iter().map(|(name, _)| name.as_str()).collect()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
