//! 跨页面检测结果合并工具
//! 按技术名称合并特征集合（结构相等去重）

use std::collections::hash_map::Entry;

use crate::detector::DetectionResult;

/// 检测结果合并工具
pub struct SignatureAggregator;

impl SignatureAggregator {
    /// 合并 `result` 到 `into` 并返回合并后的结果
    ///
    /// 满足交换律、结合律，重复合并同一结果是幂等的。
    pub fn merge(result: DetectionResult, mut into: DetectionResult) -> DetectionResult {
        Self::merge_into(&mut into, result);
        into
    }

    /// 原地合并
    pub fn merge_into(into: &mut DetectionResult, result: DetectionResult) {
        for (tech_name, signatures) in result.technologies {
            match into.technologies.entry(tech_name) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().extend(signatures);
                }
                Entry::Vacant(entry) => {
                    entry.insert(signatures);
                }
            }
        }
    }
}
