//! 搜索历史汇总 - 业务能力层

use crate::infrastructure::SearchHistoryEntry;

/// 历史统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub total_searches: usize,
    pub total_products: usize,
    /// 最常搜索的词（不区分大小写，首字母大写）
    pub popular_term: Option<String>,
}

impl HistorySummary {
    pub fn from_entries(entries: &[SearchHistoryEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        // 按首次出现顺序计数，次数相同时先出现者胜出
        let mut counts: Vec<(String, usize)> = Vec::new();
        for entry in entries {
            let term = entry.search_term.to_lowercase();
            match counts.iter_mut().find(|(t, _)| *t == term) {
                Some((_, count)) => *count += 1,
                None => counts.push((term, 1)),
            }
        }

        let mut popular: Option<(String, usize)> = None;
        for (term, count) in counts {
            if popular.as_ref().map_or(true, |(_, max)| count > *max) {
                popular = Some((term, count));
            }
        }

        Self {
            total_searches: entries.len(),
            total_products: entries.iter().map(|e| e.result_count).sum(),
            popular_term: popular.map(|(term, _)| capitalize(&term)),
        }
    }
}

/// 不区分大小写的子串过滤；空白关键字返回全部
pub fn filter_history<'a>(entries: &'a [SearchHistoryEntry], term: &str) -> Vec<&'a SearchHistoryEntry> {
    let term = term.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| term.is_empty() || e.search_term.to_lowercase().contains(&term))
        .collect()
}

fn capitalize(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
