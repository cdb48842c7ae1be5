use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::blocks::{self, BlockDefaults, TextBlock};
use crate::grouping::{BubbleGrouper, Group};
use crate::ocr::OcrDetection;
use crate::providers::{TranslationItem, TranslationProvider, is_error_marker};
use crate::redistribute::distribute;

/// Blocks and bubble groups of one page. Rebuilt wholesale for every OCR pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Page {
    blocks: Vec<TextBlock>,
    groups: Vec<Group>,
}

impl Page {
    pub fn new(blocks: Vec<TextBlock>, grouper: &BubbleGrouper) -> Self {
        let groups = grouper.group(&blocks);
        Self { blocks, groups }
    }

    pub fn from_detections(
        detections: &[OcrDetection],
        grouper: &BubbleGrouper,
        defaults: &BlockDefaults,
    ) -> Self {
        let page = Self::new(blocks::materialize(detections, defaults), grouper);
        info!(
            "recognized {} blocks, grouped into {} sentences",
            page.blocks.len(),
            page.groups.len()
        );
        page
    }

    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn block_mut(&mut self, id: usize) -> Option<&mut TextBlock> {
        self.blocks.iter_mut().find(|block| block.id() == id)
    }

    fn block(&self, id: usize) -> Option<&TextBlock> {
        self.blocks.iter().find(|block| block.id() == id)
    }

    fn group(&self, group_index: usize) -> Result<&Group> {
        self.groups.get(group_index).ok_or_else(|| {
            anyhow!(
                "group {} out of range ({} groups)",
                group_index,
                self.groups.len()
            )
        })
    }

    fn join_members<F>(&self, group: &Group, text: F) -> String
    where
        F: Fn(&TextBlock) -> &str,
    {
        group
            .ids()
            .iter()
            .filter_map(|&id| self.block(id))
            .map(text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Original text of a group, members joined with spaces in reading order.
    pub fn combined_original(&self, group_index: usize) -> Result<String> {
        let group = self.group(group_index)?;
        Ok(self.join_members(group, TextBlock::original_text))
    }

    /// Translated text of a group; members without a translation are skipped.
    pub fn combined_translation(&self, group_index: usize) -> Result<String> {
        let group = self.group(group_index)?;
        Ok(self.joined_translation(group))
    }

    fn joined_translation(&self, group: &Group) -> String {
        group
            .ids()
            .iter()
            .filter_map(|&id| self.block(id))
            .map(|block| block.translated_text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// One combined sentence per group, in group order.
    pub fn sentences(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|group| self.join_members(group, TextBlock::original_text))
            .collect()
    }

    pub fn has_translations(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| !block.translated_text.is_empty())
    }

    /// Indices of groups whose translation came back as an error marker.
    pub fn failed_groups(&self) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, group)| is_error_marker(&self.joined_translation(group)))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Replaces a group's combined translation and re-splits it over the members.
    pub fn edit_group_translation(&mut self, group_index: usize, text: &str) -> Result<()> {
        let group = self.group(group_index)?.clone();
        distribute(&group, &mut self.blocks, text);
        Ok(())
    }

    pub fn set_group_style(
        &mut self,
        group_index: usize,
        font_name: &str,
        font_size: u32,
    ) -> Result<()> {
        let ids = self.group(group_index)?.ids().to_vec();
        for id in ids {
            if let Some(block) = self.block_mut(id) {
                block.font_name = font_name.to_string();
                block.font_size = font_size;
            }
        }
        Ok(())
    }

    pub(crate) fn apply_translations(&mut self, items: &[TranslationItem]) -> Result<()> {
        if items.len() != self.groups.len() {
            return Err(anyhow!(
                "expected {} translated sentences, got {}",
                self.groups.len(),
                items.len()
            ));
        }
        for (group, item) in self.groups.iter().zip(items) {
            distribute(group, &mut self.blocks, &item.translated);
        }
        Ok(())
    }
}

/// The batch call failed; `page` still holds the grouped, untranslated blocks.
#[derive(Debug, Error)]
#[error("translation failed: {source:#}")]
pub struct PageError {
    pub page: Page,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub source_lang: String,
    pub target_lang: String,
    pub blocks: BlockDefaults,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            source_lang: "auto".to_string(),
            target_lang: "en".to_string(),
            blocks: BlockDefaults::default(),
        }
    }
}

/// detections → blocks → groups → one batch translation → redistribution.
#[derive(Debug, Clone)]
pub struct TranslationPipeline<P: TranslationProvider> {
    provider: P,
    grouper: BubbleGrouper,
    options: PipelineOptions,
}

impl<P: TranslationProvider> TranslationPipeline<P> {
    pub fn new(provider: P, grouper: BubbleGrouper, options: PipelineOptions) -> Self {
        Self {
            provider,
            grouper,
            options,
        }
    }

    /// Materializes and groups blocks without translating.
    pub fn prepare(&self, detections: &[OcrDetection]) -> Page {
        Page::from_detections(detections, &self.grouper, &self.options.blocks)
    }

    /// Translates every group of `page` in a single batch and redistributes
    /// the results. On error the page is left untouched.
    pub async fn translate(&self, page: &mut Page) -> Result<()> {
        if page.groups.is_empty() {
            return Ok(());
        }
        let items: Vec<TranslationItem> = page
            .sentences()
            .into_iter()
            .map(TranslationItem::new)
            .collect();
        info!(
            "translating {} sentences with {} ({} -> {})",
            items.len(),
            self.provider.kind().display_name(),
            self.options.source_lang,
            self.options.target_lang
        );
        let translated = self
            .provider
            .translate_batch(items, &self.options.source_lang, &self.options.target_lang)
            .await?;
        page.apply_translations(&translated)?;

        let failed = page.failed_groups();
        if !failed.is_empty() {
            warn!("{} sentences failed to translate", failed.len());
        }
        Ok(())
    }

    pub async fn run(&self, detections: &[OcrDetection]) -> Result<Page, PageError> {
        let mut page = self.prepare(detections);
        match self.translate(&mut page).await {
            Ok(()) => Ok(page),
            Err(source) => Err(PageError { page, source }),
        }
    }

    /// Blocking form of [`run`](Self::run). Must not be called from inside an
    /// async runtime.
    pub fn run_blocking(&self, detections: &[OcrDetection]) -> Result<Page, PageError> {
        runtime().block_on(self.run(detections))
    }
}

fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("failed to init runtime"))
}
