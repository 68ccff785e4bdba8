use unicode_width::UnicodeWidthStr;

use crate::buffer::{PaddedFormattingTokens, StringJoinBuffer};
use crate::convert::convert_value_to_dom;
use crate::error::FracturedJsonError;
use crate::model::{BracketPaddingType, JsonItem, JsonItemType, TableColumnType};
use crate::options::{CommentPolicy, FracturedJsonOptions, TableCommaPlacement};
use crate::parser::Parser;
use crate::table_template::TableTemplate;

fn make_width_fn(east_asian: bool) -> impl Fn(&str) -> usize {
    move |s: &str| {
        if east_asian {
            UnicodeWidthStr::width(s)
        } else {
            s.chars().count()
        }
    }
}

fn is_data_child(item: &JsonItem) -> bool {
    !matches!(
        item.item_type,
        JsonItemType::BlankLine | JsonItemType::LineComment | JsonItemType::BlockComment
    )
}

fn bracket_padding_type(item: &JsonItem) -> BracketPaddingType {
    if !item.children.iter().any(is_data_child) {
        return BracketPaddingType::Empty;
    }
    let has_nested = item
        .children
        .iter()
        .any(|c| matches!(c.item_type, JsonItemType::Array | JsonItemType::Object));
    if has_nested {
        BracketPaddingType::Complex
    } else {
        BracketPaddingType::Simple
    }
}

/// Strips leading whitespace from continuation lines of a multi-line comment,
/// up to `reference_column` characters, so reindented comments line up under
/// their original column rather than the (likely different) output column.
fn normalize_comment_lines(text: &str, reference_column: usize) -> String {
    let mut lines: Vec<String> = text.split('\n').map(|s| s.to_string()).collect();
    for line in lines.iter_mut().skip(1) {
        let mut chars = line.chars().peekable();
        let mut stripped = 0usize;
        while stripped < reference_column {
            match chars.peek() {
                Some(c) if c.is_whitespace() && *c != '\n' => {
                    chars.next();
                    stripped += 1;
                }
                _ => break,
            }
        }
        let mut new_line: String = chars.collect();
        while new_line.ends_with(|c: char| c == ' ' || c == '\t' || c == '\r') {
            new_line.pop();
        }
        *line = new_line;
    }
    if let Some(first) = lines.first_mut() {
        while first.ends_with(|c: char| c == ' ' || c == '\t' || c == '\r') {
            first.pop();
        }
    }
    lines.join("\n")
}

/// Computes measured widths bottom-up and decides/emits layout top-down.
///
/// A fresh engine is built for every call to [`Formatter::reformat`] or
/// [`Formatter::serialize`] - it carries no state between calls.
struct LayoutEngine {
    options: FracturedJsonOptions,
    pads: PaddedFormattingTokens,
    width_fn: Box<dyn Fn(&str) -> usize>,
}

impl LayoutEngine {
    fn new(options: FracturedJsonOptions) -> Self {
        let width_fn = make_width_fn(options.east_asian_width);
        let pads = PaddedFormattingTokens::new(&options, &width_fn);
        Self {
            options,
            pads,
            width_fn: Box::new(width_fn),
        }
    }

    fn measure(&self, s: &str) -> usize {
        (self.width_fn)(s)
    }

    fn write_line_start(&mut self, buf: &mut StringJoinBuffer, depth: usize) {
        if !self.options.prefix_string.is_empty() {
            buf.add(&self.options.prefix_string);
        }
        let indent = self.pads.indent(depth);
        buf.add(&indent);
    }

    fn available_space(&mut self, depth: usize) -> usize {
        let indent = self.pads.indent(depth);
        let indent_len = self.measure(&indent);
        let base = self
            .options
            .max_total_line_length
            .saturating_sub(self.pads.prefix_string_len())
            .saturating_sub(indent_len);
        base.min(self.options.max_inline_length)
    }

    fn depth_allows_inline(&self, depth: usize) -> bool {
        self.options.always_expand_depth < 0 || (depth as isize) > self.options.always_expand_depth
    }

    // ---- length computer ----

    fn compute_lengths(&self, item: &mut JsonItem) {
        for child in &mut item.children {
            self.compute_lengths(child);
        }

        item.prefix_comment_length = self.measure(&item.prefix_comment);
        item.middle_comment_length = self.measure(&item.middle_comment);
        item.postfix_comment_length = self.measure(&item.postfix_comment);
        item.name_length = self.measure(&item.name);

        let mut requires_multiline = matches!(
            item.item_type,
            JsonItemType::BlankLine | JsonItemType::LineComment
        ) || !item.prefix_comment.is_empty()
            || item.middle_comment_has_new_line
            || item.postfix_comment.contains('\n')
            || item.value.contains('\n')
            || item.is_post_comment_line_style;

        match item.item_type {
            JsonItemType::Array | JsonItemType::Object => {
                let pad_type = bracket_padding_type(item);
                let data_children: Vec<&JsonItem> =
                    item.children.iter().filter(|c| is_data_child(c)).collect();
                let sum_children: usize =
                    data_children.iter().map(|c| c.minimum_total_length).sum();
                let comma_count = data_children.len().saturating_sub(1);
                item.value_length = self.pads.start_len(item.item_type, pad_type)
                    + self.pads.end_len(item.item_type, pad_type)
                    + sum_children
                    + comma_count * self.pads.comma_len();

                if item.children.iter().any(|c| c.requires_multiple_lines) {
                    requires_multiline = true;
                }
                if data_children.len() != item.children.len() {
                    requires_multiline = true;
                }
            }
            _ => {
                item.value_length = self.measure(&item.value);
            }
        }

        item.requires_multiple_lines = requires_multiline;

        item.minimum_total_length = (if item.prefix_comment_length > 0 {
            item.prefix_comment_length + self.pads.comment_len()
        } else {
            0
        }) + (if item.name_length > 0 {
            item.name_length + self.pads.colon_len()
        } else {
            0
        }) + (if item.middle_comment_length > 0 {
            item.middle_comment_length + self.pads.comment_len()
        } else {
            0
        }) + item.value_length
            + (if item.postfix_comment_length > 0 {
                item.postfix_comment_length + self.pads.comment_len()
            } else {
                0
            });
    }

    // ---- pure inline text rendering (no buffer, used for measurement-matched output) ----

    fn render_node_inline(&self, item: &JsonItem) -> String {
        let mut s = String::new();
        if !item.name.is_empty() {
            s.push_str(&item.name);
            s.push_str(self.pads.colon());
        }
        if !item.middle_comment.is_empty() {
            s.push_str(&item.middle_comment);
            s.push_str(self.pads.comment());
        }
        match item.item_type {
            JsonItemType::Array | JsonItemType::Object => {
                s.push_str(&self.render_container_inline(item));
            }
            _ => s.push_str(&item.value),
        }
        if !item.postfix_comment.is_empty() {
            s.push_str(self.pads.comment());
            s.push_str(&item.postfix_comment);
        }
        s
    }

    fn render_container_inline(&self, item: &JsonItem) -> String {
        let pad_type = bracket_padding_type(item);
        let mut s = String::new();
        s.push_str(self.pads.start(item.item_type, pad_type));
        let data_children: Vec<&JsonItem> = item.children.iter().filter(|c| is_data_child(c)).collect();
        for (i, child) in data_children.iter().enumerate() {
            if i > 0 {
                s.push_str(self.pads.comma());
            }
            s.push_str(&self.render_node_inline(child));
        }
        s.push_str(self.pads.end(item.item_type, pad_type));
        s
    }

    fn render_atomic_value(&self, item: &JsonItem) -> String {
        match item.item_type {
            JsonItemType::Array | JsonItemType::Object => self.render_container_inline(item),
            _ => item.value.clone(),
        }
    }

    // ---- comment emission ----

    fn write_comment_text(&mut self, buf: &mut StringJoinBuffer, text: &str, reference_column: usize) {
        if !text.contains('\n') {
            buf.add(text);
            return;
        }
        let normalized = normalize_comment_lines(text, reference_column);
        let mut lines = normalized.split('\n').peekable();
        while let Some(line) = lines.next() {
            buf.add(line);
            if lines.peek().is_some() {
                buf.end_line(self.pads.eol());
            }
        }
    }

    // ---- per-item emission (used for top-level items and Expanded children) ----

    fn write_name_and_middle(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem, name_pad: Option<usize>) {
        if !item.name.is_empty() {
            buf.add(&item.name);
            match name_pad {
                Some(pad) if self.options.colon_before_prop_name_padding => {
                    buf.add(self.pads.colon());
                    buf.spaces(pad.saturating_sub(item.name_length));
                }
                Some(pad) => {
                    buf.spaces(pad.saturating_sub(item.name_length));
                    buf.add(self.pads.colon());
                }
                None => {
                    buf.add(self.pads.colon());
                }
            }
        }
        if !item.middle_comment.is_empty() {
            let col = item.input_position.column;
            self.write_comment_text(buf, &item.middle_comment.clone(), col);
            buf.add(self.pads.comment());
        }
    }

    fn finish_line(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem, include_comma: bool) {
        if item.item_type == JsonItemType::BlankLine {
            buf.end_line(self.pads.eol());
            return;
        }
        if include_comma {
            buf.add(self.pads.comma());
        }
        if !item.postfix_comment.is_empty() {
            buf.add(self.pads.comment());
            let col = item.input_position.column;
            self.write_comment_text(buf, &item.postfix_comment.clone(), col);
        }
        buf.end_line(self.pads.eol());
    }

    fn format_item(
        &mut self,
        buf: &mut StringJoinBuffer,
        item: &JsonItem,
        depth: usize,
        include_comma: bool,
        name_pad: Option<usize>,
    ) {
        if !item.prefix_comment.is_empty() {
            self.write_line_start(buf, depth);
            let col = item.input_position.column;
            self.write_comment_text(buf, &item.prefix_comment.clone(), col);
            buf.end_line(self.pads.eol());
            self.write_line_start(buf, depth);
        }

        if matches!(item.item_type, JsonItemType::Array | JsonItemType::Object) {
            if self.try_inline(buf, item, depth, include_comma) {
                return;
            }
            self.write_name_and_middle(buf, item, name_pad);
            self.format_container_body(buf, item, depth);
            self.finish_line(buf, item, include_comma);
            return;
        }

        match item.item_type {
            JsonItemType::LineComment | JsonItemType::BlockComment | JsonItemType::BlankLine => {
                self.emit_standalone(buf, item);
            }
            _ => {
                self.write_name_and_middle(buf, item, name_pad);
                buf.add(&item.value);
            }
        }
        self.finish_line(buf, item, include_comma);
    }

    /// Writes a non-data child (standalone line/block comment or preserved blank line) in
    /// place, without consuming a table column slot or affecting comma placement.
    fn emit_standalone(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem) {
        match item.item_type {
            JsonItemType::LineComment | JsonItemType::BlockComment => {
                let col = item.input_position.column;
                let value = item.value.clone();
                self.write_comment_text(buf, &value, col);
            }
            JsonItemType::BlankLine => {}
            _ => {}
        }
    }

    fn try_inline(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem, depth: usize, include_comma: bool) -> bool {
        if !self.depth_allows_inline(depth) {
            return false;
        }
        if item.requires_multiple_lines {
            return false;
        }
        if self.options.max_inline_complexity < 0
            || item.complexity as isize > self.options.max_inline_complexity
        {
            return false;
        }
        let avail = self.available_space(depth);
        let comma_len = if include_comma { self.pads.comma_len() } else { 0 };
        if item.minimum_total_length + comma_len > avail {
            return false;
        }
        let text = self.render_node_inline(item);
        buf.add(&text);
        if include_comma {
            buf.add(self.pads.comma());
        }
        buf.end_line(self.pads.eol());
        true
    }

    // ---- container body (value-only) layout selection ----

    fn format_container_body(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem, depth: usize) {
        if item.item_type == JsonItemType::Array && self.try_compact_array(buf, item, depth) {
            return;
        }
        if let Some(template) = self.try_table(item, depth) {
            self.emit_table(buf, item, depth, &template);
            return;
        }
        self.emit_expanded(buf, item, depth);
    }

    fn try_compact_array(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem, depth: usize) -> bool {
        if !self.depth_allows_inline(depth) {
            return false;
        }
        if self.options.max_compact_array_complexity < 0
            || item.complexity as isize > self.options.max_compact_array_complexity
        {
            return false;
        }
        let data_children: Vec<&JsonItem> = item.children.iter().filter(|c| is_data_child(c)).collect();
        if data_children.len() < self.options.min_compact_array_row_items {
            return false;
        }
        if data_children.iter().any(|c| c.requires_multiple_lines) {
            return false;
        }

        let avail = self.available_space(depth + 1);

        // Build a shared column template across all elements the way a table row would,
        // so that parallel siblings (plain numbers, or nested arrays/objects of numbers,
        // e.g. coordinate pairs) line up even though they're wrapped several-per-line
        // rather than one-per-line.
        let mut template = TableTemplate::new(self.pads.clone(), self.options.number_list_alignment);
        template.measure_table_root(item, true);
        let aligned = !matches!(
            template.column_type,
            TableColumnType::Mixed | TableColumnType::Unknown
        ) && template.try_to_fit(avail);

        let max_item_width = if aligned {
            template.total_length
        } else {
            data_children.iter().map(|c| c.minimum_total_length).max().unwrap_or(0)
        };
        let per_item_width = max_item_width + self.pads.comma_len();
        if per_item_width == 0 {
            return false;
        }
        let mut items_per_row = (avail / per_item_width).max(1);
        if items_per_row < self.options.min_compact_array_row_items {
            if self.options.min_compact_array_row_items * per_item_width > avail {
                return false;
            }
            items_per_row = self.options.min_compact_array_row_items;
        }

        let pad_type = bracket_padding_type(item);
        buf.add(self.pads.start(item.item_type, pad_type));
        buf.end_line(self.pads.eol());

        let last_data_idx = item.children.iter().rposition(is_data_child);
        let mut pending: Vec<&JsonItem> = Vec::with_capacity(items_per_row);
        for (i, child) in item.children.iter().enumerate() {
            if is_data_child(child) {
                pending.push(child);
                let is_last_overall = Some(i) == last_data_idx;
                if pending.len() == items_per_row || is_last_overall {
                    self.emit_compact_row(buf, &pending, depth + 1, aligned, &template, is_last_overall);
                    pending.clear();
                }
            } else {
                if !pending.is_empty() {
                    self.emit_compact_row(buf, &pending, depth + 1, aligned, &template, false);
                    pending.clear();
                }
                self.write_line_start(buf, depth + 1);
                self.emit_standalone(buf, child);
                buf.end_line(self.pads.eol());
            }
        }
        if !pending.is_empty() {
            self.emit_compact_row(buf, &pending, depth + 1, aligned, &template, true);
        }

        self.write_line_start(buf, depth);
        buf.add(self.pads.end(item.item_type, pad_type));
        true
    }

    /// Renders one packed row of a MultilineCompact array. A standalone comment between
    /// data items forces the row in progress to flush early, same as `emit_expanded` giving
    /// a comment its own line; `is_last_row` controls whether the row's final item gets a
    /// comma at all (aligned cells still get a dummy comma's width to keep columns lined up).
    fn emit_compact_row(
        &mut self,
        buf: &mut StringJoinBuffer,
        row: &[&JsonItem],
        depth: usize,
        aligned: bool,
        template: &TableTemplate,
        is_last_row: bool,
    ) {
        if row.is_empty() {
            return;
        }
        self.write_line_start(buf, depth);
        let last_idx = row.len() - 1;
        for (i, child) in row.iter().enumerate() {
            let is_last_overall = is_last_row && i == last_idx;
            if aligned {
                self.emit_cell(buf, Some(child), template, !is_last_overall);
            } else {
                let text = self.render_node_inline(child);
                buf.add(&text);
                if !is_last_overall {
                    buf.add(self.pads.comma());
                }
            }
        }
        buf.end_line(self.pads.eol());
    }

    fn try_table(&mut self, item: &JsonItem, depth: usize) -> Option<TableTemplate> {
        if self.options.max_table_row_complexity < 0 {
            return None;
        }
        if item.complexity as isize > self.options.max_table_row_complexity + 1 {
            return None;
        }
        let data_children: Vec<&JsonItem> = item.children.iter().filter(|c| is_data_child(c)).collect();
        if data_children.len() < 2 {
            return None;
        }
        if data_children.iter().any(|c| c.requires_multiple_lines) {
            return None;
        }

        let avail = self.available_space(depth + 1);
        let comma_len = self.pads.comma_len();
        if data_children
            .iter()
            .any(|c| c.minimum_total_length + comma_len > avail)
        {
            return None;
        }

        let mut template = TableTemplate::new(self.pads.clone(), self.options.number_list_alignment);
        template.measure_table_root(item, true);

        if matches!(
            template.column_type,
            TableColumnType::Mixed | TableColumnType::Unknown | TableColumnType::Simple
        ) {
            return None;
        }

        if !self.passes_similarity(item, &template) {
            return None;
        }

        if !template.try_to_fit(avail.saturating_sub(comma_len)) {
            return None;
        }

        Some(template)
    }

    fn passes_similarity(&self, item: &JsonItem, template: &TableTemplate) -> bool {
        let threshold = if item.item_type == JsonItemType::Array {
            self.options.table_array_minimum_similarity
        } else {
            self.options.table_object_minimum_similarity
        };
        if threshold > 100 {
            return false;
        }
        if template.children.is_empty() {
            return true;
        }

        let data_children: Vec<&JsonItem> = item.children.iter().filter(|c| is_data_child(c)).collect();
        let total_slots = template.children.len() * data_children.len();
        if total_slots == 0 {
            return true;
        }

        let mut filled = 0usize;
        for row in &data_children {
            match template.column_type {
                TableColumnType::Array => {
                    filled += row.children.len().min(template.children.len());
                }
                TableColumnType::Object => {
                    for sub in &template.children {
                        if row
                            .children
                            .iter()
                            .any(|c| Some(c.name.as_str()) == sub.location_in_parent.as_deref())
                        {
                            filled += 1;
                        }
                    }
                }
                _ => {}
            }
        }
        filled * 100 / total_slots >= threshold
    }

    // ---- Expanded layout ----

    fn compute_name_padding(&mut self, item: &JsonItem, child_depth: usize) -> Option<usize> {
        let data_children: Vec<&JsonItem> = item
            .children
            .iter()
            .filter(|c| is_data_child(c) && !c.name.is_empty())
            .collect();
        if data_children.len() < 2 {
            return None;
        }
        if data_children.iter().any(|c| c.middle_comment_has_new_line) {
            return None;
        }

        let max_name = data_children.iter().map(|c| c.name_length).max().unwrap_or(0);
        let min_name = data_children.iter().map(|c| c.name_length).min().unwrap_or(0);
        let raw_pad = max_name.saturating_sub(min_name);
        let pad = raw_pad.min(self.options.max_prop_name_padding);
        if pad == 0 {
            return None;
        }
        let effective_max = min_name + pad;

        let avail = self.available_space(child_depth);
        let comma_len = self.pads.comma_len();
        for c in &data_children {
            let extra = effective_max.saturating_sub(c.name_length);
            if c.minimum_total_length + extra + comma_len > avail {
                return None;
            }
        }
        Some(effective_max)
    }

    fn emit_expanded(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem, depth: usize) {
        let pad_type = bracket_padding_type(item);
        buf.add(self.pads.start(item.item_type, pad_type));
        buf.end_line(self.pads.eol());

        let name_pad = self.compute_name_padding(item, depth + 1);
        let last_data_idx = item.children.iter().rposition(is_data_child);

        for (i, child) in item.children.iter().enumerate() {
            self.write_line_start(buf, depth + 1);
            let include_comma = is_data_child(child) && Some(i) != last_data_idx;
            let pad = if is_data_child(child) { name_pad } else { None };
            self.format_item(buf, child, depth + 1, include_comma, pad);
        }

        self.write_line_start(buf, depth);
        buf.add(self.pads.end(item.item_type, pad_type));
    }

    // ---- Table layout ----

    fn emit_table(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem, depth: usize, template: &TableTemplate) {
        let pad_type = bracket_padding_type(item);
        buf.add(self.pads.start(item.item_type, pad_type));
        buf.end_line(self.pads.eol());

        let last_data_idx = item.children.iter().rposition(is_data_child);
        for (i, child) in item.children.iter().enumerate() {
            self.write_line_start(buf, depth + 1);
            if is_data_child(child) {
                let include_comma = Some(i) != last_data_idx;
                self.emit_cell(buf, Some(child), template, include_comma);
            } else {
                self.emit_standalone(buf, child);
            }
            buf.end_line(self.pads.eol());
        }

        self.write_line_start(buf, depth);
        buf.add(self.pads.end(item.item_type, pad_type));
    }

    fn emit_cell(
        &mut self,
        buf: &mut StringJoinBuffer,
        item_opt: Option<&JsonItem>,
        template: &TableTemplate,
        include_comma: bool,
    ) {
        if template.prefix_comment_length > 0 {
            match item_opt.filter(|it| !it.prefix_comment.is_empty()) {
                Some(item) => {
                    buf.add(&item.prefix_comment);
                    let w = self.measure(&item.prefix_comment);
                    buf.spaces(template.prefix_comment_length.saturating_sub(w));
                }
                None => buf.spaces(template.prefix_comment_length),
            }
            buf.add(self.pads.comment());
        }

        if template.name_length > 0 {
            match item_opt {
                Some(item) if !item.name.is_empty() => {
                    buf.add(&item.name);
                    buf.spaces(template.name_length.saturating_sub(item.name_length));
                }
                _ => buf.spaces(template.name_length),
            }
            buf.add(self.pads.colon());
        }

        if template.middle_comment_length > 0 {
            match item_opt.filter(|it| !it.middle_comment.is_empty()) {
                Some(item) => {
                    buf.add(&item.middle_comment);
                    let w = self.measure(&item.middle_comment);
                    buf.spaces(template.middle_comment_length.saturating_sub(w));
                }
                None => buf.spaces(template.middle_comment_length),
            }
            buf.add(self.pads.comment());
        }

        self.emit_cell_value(buf, item_opt, template, include_comma);

        if template.postfix_comment_length > 0 {
            buf.add(self.pads.comment());
            match item_opt.filter(|it| !it.postfix_comment.is_empty()) {
                Some(item) => {
                    buf.add(&item.postfix_comment);
                    let w = self.measure(&item.postfix_comment);
                    buf.spaces(template.postfix_comment_length.saturating_sub(w));
                }
                None => buf.spaces(template.postfix_comment_length),
            }
        }
    }

    fn emit_cell_value(
        &mut self,
        buf: &mut StringJoinBuffer,
        item_opt: Option<&JsonItem>,
        template: &TableTemplate,
        include_comma: bool,
    ) {
        let is_number_col = template.column_type == TableColumnType::Number;
        let comma_before_padding = match self.options.table_comma_placement {
            TableCommaPlacement::BeforePadding => true,
            TableCommaPlacement::AfterPadding => false,
            TableCommaPlacement::BeforePaddingExceptNumbers => !is_number_col,
        };
        let comma_tok = if include_comma {
            self.pads.comma().to_string()
        } else {
            self.pads.dummy_comma().to_string()
        };

        if is_number_col {
            match item_opt {
                Some(item) => {
                    let embed = if comma_before_padding { comma_tok.as_str() } else { "" };
                    template.format_number(buf, item, embed);
                    if !comma_before_padding {
                        buf.add(&comma_tok);
                    }
                }
                None => {
                    buf.spaces(template.composite_value_length);
                    buf.add(&comma_tok);
                }
            }
            return;
        }

        let is_nested_container = matches!(template.column_type, TableColumnType::Array | TableColumnType::Object)
            && !template.children.is_empty();
        if is_nested_container {
            match item_opt {
                Some(item) => {
                    self.emit_row_container(buf, item, template);
                }
                None => buf.spaces(template.composite_value_length),
            }
            buf.add(&comma_tok);
            return;
        }

        let text = item_opt.map(|it| self.render_atomic_value(it)).unwrap_or_default();
        let width = self.measure(&text);
        let pad = template.composite_value_length.saturating_sub(width);
        if comma_before_padding {
            buf.add(&text);
            buf.add(&comma_tok);
            buf.spaces(pad);
        } else {
            buf.add(&text);
            buf.spaces(pad);
            buf.add(&comma_tok);
        }
    }

    fn emit_row_container(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem, template: &TableTemplate) {
        let pad_type = template.pad_type;
        buf.add(self.pads.start(item.item_type, pad_type));
        let is_array = template.column_type == TableColumnType::Array;
        let last = template.children.len().saturating_sub(1);
        for (i, sub_template) in template.children.iter().enumerate() {
            let sub_item = if is_array {
                item.children.get(i)
            } else {
                item.children
                    .iter()
                    .find(|c| sub_template.location_in_parent.as_deref() == Some(c.name.as_str()))
            };
            self.emit_cell(buf, sub_item, sub_template, i != last);
        }
        buf.add(self.pads.end(item.item_type, pad_type));
    }
}

/// Writes a compact, whitespace-free rendering of the parsed tree.
/// Runs independently of the length computer / layout engine - minification
/// doesn't need measured widths, only the raw token values.
struct Minifier {
    options: FracturedJsonOptions,
    pads: PaddedFormattingTokens,
}

impl Minifier {
    fn new(options: FracturedJsonOptions) -> Self {
        let width_fn = make_width_fn(options.east_asian_width);
        let pads = PaddedFormattingTokens::new(&options, &width_fn);
        Self { options, pads }
    }

    fn minify(&mut self, items: &[JsonItem]) -> String {
        let mut buf = StringJoinBuffer::default();
        for item in items {
            self.write_item(&mut buf, item, false);
        }
        buf.flush();
        buf.as_string()
    }

    fn preserves_comments(&self) -> bool {
        self.options.comment_policy == CommentPolicy::Preserve
    }

    fn write_item(&mut self, buf: &mut StringJoinBuffer, item: &JsonItem, include_comma: bool) {
        match item.item_type {
            JsonItemType::BlankLine => {}
            JsonItemType::LineComment => {
                if self.preserves_comments() {
                    buf.add(&item.value);
                    buf.end_line(self.pads.eol());
                }
            }
            JsonItemType::BlockComment => {
                if self.preserves_comments() {
                    buf.add(&item.value);
                }
            }
            _ => {
                if self.preserves_comments() && !item.prefix_comment.is_empty() {
                    buf.add(&item.prefix_comment);
                    if item.prefix_comment.trim_start().starts_with("//") {
                        buf.end_line(self.pads.eol());
                    }
                }
                if !item.name.is_empty() {
                    buf.add(&item.name);
                    buf.add(":");
                }
                if self.preserves_comments() && !item.middle_comment.is_empty() {
                    buf.add(&item.middle_comment);
                    if item.middle_comment.trim_start().starts_with("//") {
                        buf.end_line(self.pads.eol());
                    }
                }

                match item.item_type {
                    JsonItemType::Array | JsonItemType::Object => {
                        buf.add(self.pads.start(item.item_type, BracketPaddingType::Empty));
                        let last = item.children.iter().rposition(is_data_child);
                        for (i, child) in item.children.iter().enumerate() {
                            let comma = is_data_child(child) && Some(i) != last;
                            self.write_item(buf, child, comma);
                        }
                        buf.add(self.pads.end(item.item_type, BracketPaddingType::Empty));
                    }
                    _ => buf.add(&item.value),
                }

                if include_comma {
                    buf.add(",");
                }

                if self.preserves_comments() && !item.postfix_comment.is_empty() {
                    if item.is_post_comment_line_style {
                        buf.end_line(self.pads.eol());
                        buf.add(&item.postfix_comment);
                        buf.end_line(self.pads.eol());
                    } else {
                        buf.add(&item.postfix_comment);
                    }
                }
            }
        }
    }
}

/// Entry point for reformatting, minifying, or serializing JSON.
///
/// See the crate-level documentation for usage examples.
pub struct Formatter {
    /// Formatting configuration. Mutate fields directly before calling
    /// [`Formatter::reformat`], [`Formatter::minify`], or [`Formatter::serialize`].
    pub options: FracturedJsonOptions,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {
            options: FracturedJsonOptions::default(),
        }
    }

    /// Parses `input` as JSON (or JSON-with-comments, depending on
    /// `options.comment_policy`) and returns a reformatted rendering.
    pub fn reformat(&mut self, input: &str, start_depth: usize) -> Result<String, FracturedJsonError> {
        let parser = Parser::new(self.options.clone());
        let mut top_items = parser.parse_top_level(input, false)?;
        Ok(self.lay_out(&mut top_items, start_depth))
    }

    /// Parses `input` and returns a minimal-whitespace rendering.
    pub fn minify(&mut self, input: &str) -> Result<String, FracturedJsonError> {
        let parser = Parser::new(self.options.clone());
        let top_items = parser.parse_top_level(input, false)?;
        let mut minifier = Minifier::new(self.options.clone());
        Ok(minifier.minify(&top_items))
    }

    /// Serializes any [`serde::Serialize`] value and formats the result,
    /// same as [`Formatter::reformat`] would for its JSON representation.
    pub fn serialize<T: serde::Serialize>(
        &mut self,
        value: &T,
        start_depth: usize,
        recursion_limit: usize,
    ) -> Result<String, FracturedJsonError> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| FracturedJsonError::simple(format!("serialization failed: {}", e)))?;
        let item = convert_value_to_dom(&json_value, None, recursion_limit)?;
        let mut top_items: Vec<JsonItem> = item.into_iter().collect();
        Ok(self.lay_out(&mut top_items, start_depth))
    }

    fn lay_out(&mut self, top_items: &mut [JsonItem], start_depth: usize) -> String {
        let mut engine = LayoutEngine::new(self.options.clone());
        for item in top_items.iter_mut() {
            engine.compute_lengths(item);
        }

        let mut buf = StringJoinBuffer::default();
        for item in top_items.iter() {
            engine.write_line_start(&mut buf, start_depth);
            engine.format_item(&mut buf, item, start_depth, false, None);
        }
        buf.flush();
        buf.as_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::NumberListAlignment;

    fn reformat(input: &str) -> String {
        let mut fmt = Formatter::new();
        fmt.reformat(input, 0).unwrap()
    }

    #[test]
    fn inline_array_of_primitives() {
        let out = reformat("[1, 2.1, 3, -99]");
        assert_eq!(out.trim_end(), "[1, 2.1, 3, -99]");
    }

    #[test]
    fn object_stays_inline_when_short() {
        let out = reformat(r#"{"a":1,"b":2}"#);
        assert_eq!(out.trim_end(), r#"{ "a": 1, "b": 2 }"#);
    }

    #[test]
    fn number_list_normalize_alignment() {
        let mut fmt = Formatter::new();
        fmt.options.max_inline_complexity = -1;
        fmt.options.number_list_alignment = NumberListAlignment::Normalize;
        let out = fmt.reformat("[[1, 2.5], [30, 4]]", 0).unwrap();
        assert!(out.contains('['));
        assert!(out.lines().count() >= 4);
    }

    #[test]
    fn similar_objects_form_a_table() {
        let input = r#"[
            {"type":"turret","hp":400,"loc":{"x":47,"y":-4}},
            {"type":"assassin","hp":80,"loc":{"x":12,"y":6}},
            {"type":"berserker","hp":150,"loc":{"x":0,"y":0}}
        ]"#;
        let out = reformat(input);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.len() >= 5);
        let colon_positions: Vec<usize> = lines[1..lines.len() - 1]
            .iter()
            .filter_map(|l| l.find("\"hp\""))
            .collect();
        assert!(colon_positions.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn long_array_wraps_compactly() {
        let mut fmt = Formatter::new();
        fmt.options.max_total_line_length = 40;
        let items: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        let input = format!("[{}]", items.join(","));
        let out = fmt.reformat(&input, 0).unwrap();
        assert!(out.lines().count() > 2);
    }

    #[test]
    fn comments_are_preserved() {
        let mut fmt = Formatter::new();
        fmt.options.comment_policy = CommentPolicy::Preserve;
        let input = "{\n  // leading\n  \"a\": 1 // trailing\n}";
        let out = fmt.reformat(input, 0).unwrap();
        assert!(out.contains("// leading"));
        assert!(out.contains("// trailing"));
    }

    #[test]
    fn comments_rejected_by_default() {
        let mut fmt = Formatter::new();
        let input = "{ // nope\n \"a\": 1 }";
        assert!(fmt.reformat(input, 0).is_err());
    }

    #[test]
    fn duplicate_keys_fall_back_from_table() {
        let mut fmt = Formatter::new();
        fmt.options.max_inline_complexity = 1;
        let input = r#"[ { "x":1, "y":2, "z":3 }, { "y":44, "z":55, "z":66 } ]"#;
        let out = fmt.reformat(input, 0).unwrap();

        let lines: Vec<&str> = out.trim_end().lines().collect();
        assert_eq!(lines.len(), 4);

        assert_eq!(out.matches('z').count(), 3);

        let y_positions: Vec<usize> = lines.iter().filter_map(|l| l.find('y')).collect();
        assert_eq!(y_positions.len(), 2);
        assert_ne!(y_positions[0], y_positions[1]);
    }

    #[test]
    fn minify_strips_whitespace() {
        let mut fmt = Formatter::new();
        let out = fmt.minify(r#"{ "a" : 1,  "b": [1, 2, 3] }"#).unwrap();
        assert_eq!(out.trim_end(), r#"{"a":1,"b":[1,2,3]}"#);
    }

    #[test]
    fn serialize_struct() {
        #[derive(serde::Serialize)]
        struct Player {
            name: String,
            scores: Vec<i32>,
        }
        let player = Player {
            name: "Alice".into(),
            scores: vec![95, 87, 92],
        };
        let mut fmt = Formatter::new();
        let out = fmt.serialize(&player, 0, 100).unwrap();
        assert!(out.contains("\"name\""));
        assert!(out.contains("95"));
    }

    #[test]
    fn error_reports_position() {
        let mut fmt = Formatter::new();
        let err = fmt.reformat("{ \"a\": }", 0).unwrap_err();
        assert!(err.input_position.is_some());
    }
}
