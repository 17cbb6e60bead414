//! Fixed extraction instruction: schema definition plus extraction rules.

pub const SYSTEM_PROMPT: &str = "你是一个中药知识图谱构建专家。请从文本中提取实体(Nodes)、属性(Attributes)和关系(Edges)。\
严格区分【属性】和【关系】：\
1. 属性(Attributes)：描述实体自身的特征值（如颜色、性状、数值、产地、具体的理化指标）。\
2. 关系(Edges)：连接两个独立实体的动作（如'治疗'连接药物与疾病，'含有'连接药物与成分）。\
请直接输出合法的 JSON，不要包含 Markdown 代码块。";

/// The target schema, shown to the model verbatim inside the user prompt.
pub fn graph_schema() -> serde_json::Value {
    serde_json::json!({
        "nodes": [
            {
                "id": "实体唯一标识(通常是名称)",
                "label": "实体类型(如: 药物名称, 化学成分, 实验试剂与材料, 中药药性, 经络, 疾病, 功效等)",
                "attributes": {"描述": "实体的固有属性键值对。例如：{'颜色': '黄色', '用量': '0.15-0.35g', '味道': '苦'}"}
            }
        ],
        "edges": [
            {"source": "起点实体ID", "target": "终点实体ID", "relation": "关系名称(如: 含有成分, 治疗, 归属于, 检测使用)"}
        ]
    })
}

pub fn build_user_prompt(text: &str) -> String {
    format!(
        r#"
### 任务目标
分析以下中药药典文本，构建知识图谱结构。

### 目标 Schema
{schema}

### 提取规则
1. **主实体**：药名标题（如：一枝黄花、丁香、人参）。无需提取植物来源作为node。
2. **属性提取**：
   - 将“性状”（如颜色、形状）、“用法用量”（数值）、“理化常数”（如熔点、水分限制）作为主实体的 `attributes`。
3. **关系提取**：
   - [药物] -> 含有 -> [化学成分]
   - [药物] -> 治疗 -> [疾病/症状]
   - [药物] -> 归属于 -> [经络]
   - [药物/成分] -> 检测使用 -> [试剂] (如薄层色谱法中用到的试剂)
   - 等等

### 待处理文本
{text}
"#,
        schema = serde_json::to_string_pretty(&graph_schema()).unwrap_or_default(),
        text = text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_embeds_schema_and_text() {
        let prompt = build_user_prompt("甘草【性状】根呈圆柱形。");
        assert!(prompt.contains("\"nodes\""));
        assert!(prompt.contains("\"edges\""));
        assert!(prompt.contains("甘草【性状】根呈圆柱形。"));
    }
}
