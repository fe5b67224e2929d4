// src/models/catalog.rs

use super::variant::Variant;
use crate::error::{AppError, AppResult};
use chrono::{NaiveDate, NaiveTime};
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use std::{collections::BTreeSet, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CourseId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LectureId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VideoId(usize);

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub course_codes: BTreeSet<String>,
    pub course_name: String,
    pub year: String,
    pub term: String,
    pub declared_lecture_count: u32,
    pub url: String,
    lectures: Vec<LectureId>,
}

impl Course {
    pub fn new(
        course_codes: BTreeSet<String>,
        course_name: String,
        year: String,
        term: String,
        declared_lecture_count: u32,
        url: String,
    ) -> AppResult<Self> {
        if course_codes.is_empty() {
            return Err(AppError::Parse(format!("课程 '{}' 没有任何课程代码", course_name)));
        }
        Ok(Self {
            course_codes,
            course_name,
            year,
            term,
            declared_lecture_count,
            url,
            lectures: Vec::new(),
        })
    }

    pub fn lectures(&self) -> &[LectureId] {
        &self.lectures
    }

    /// 课程代码集合与过滤集合有交集时返回 true；空过滤集合匹配所有课程。
    pub fn is_targeted(&self, filter: &BTreeSet<String>) -> bool {
        filter.is_empty() || !self.course_codes.is_disjoint(filter)
    }

    pub fn display_codes(&self) -> String {
        self.course_codes.iter().join("/")
    }
}

/// 从课时行中解析出的原始信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LectureInfo {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// 已绑定所属课程、但尚未加入课程的课时。只能通过 [`CourseCatalog::draft_lecture`] 创建。
#[derive(Debug, Clone)]
pub struct PendingLecture {
    course: CourseId,
    info: LectureInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lecture {
    course: CourseId,
    lecture_num: u32,
    #[serde(flatten)]
    pub info: LectureInfo,
    videos: Vec<VideoId>,
}

impl Lecture {
    pub fn course(&self) -> CourseId {
        self.course
    }

    pub fn lecture_num(&self) -> u32 {
        self.lecture_num
    }

    pub fn videos(&self) -> &[VideoId] {
        &self.videos
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Video {
    lecture: Option<LectureId>,
    pub variant: Variant,
    pub size: String,
    pub url: Option<String>,
    pub file_path: Option<PathBuf>,
    pub digest: Option<String>,
}

impl Video {
    pub fn new(variant: Variant, size: impl Into<String>) -> Self {
        Self {
            lecture: None,
            variant,
            size: size.into(),
            url: None,
            file_path: None,
            digest: None,
        }
    }

    pub fn lecture(&self) -> Option<LectureId> {
        self.lecture
    }

    pub fn is_resolved(&self) -> bool {
        self.url.is_some()
    }
}

/// 课程、课时、视频三层数据的集中存储。
///
/// 实体之间通过 id 相互引用；归属关系在加入时一次性设定并校验，之后不可更改。
#[derive(Debug, Default, Serialize)]
pub struct CourseCatalog {
    courses: Vec<Course>,
    lectures: Vec<Lecture>,
    videos: Vec<Video>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_course(&mut self, course: Course) -> AppResult<CourseId> {
        if !course.lectures.is_empty() {
            return Err(AppError::OwnershipViolation(format!(
                "课程 '{}' 在加入目录前已包含课时",
                course.display_codes()
            )));
        }
        let id = CourseId(self.courses.len());
        debug!("加入课程 {:?}: {}", id, course.display_codes());
        self.courses.push(course);
        Ok(id)
    }

    pub fn draft_lecture(&self, course: CourseId, info: LectureInfo) -> AppResult<PendingLecture> {
        self.course(course)?;
        Ok(PendingLecture { course, info })
    }

    /// 将课时追加到课程末尾，课时编号按追加顺序从 1 开始连续分配。
    pub fn append_lecture(
        &mut self,
        course_id: CourseId,
        pending: PendingLecture,
    ) -> AppResult<LectureId> {
        if pending.course != course_id {
            return Err(AppError::OwnershipViolation(format!(
                "课时 '{}' 属于课程 {:?}，不能加入课程 {:?}",
                pending.info.title, pending.course, course_id
            )));
        }
        let next_id = LectureId(self.lectures.len());
        let course = self.course_mut(course_id)?;
        let count = course.lectures.len() as u32;
        if count >= course.declared_lecture_count {
            return Err(AppError::OwnershipViolation(format!(
                "课程 '{}' 声明共有 {} 个课时，无法再追加 '{}'",
                course.display_codes(),
                course.declared_lecture_count,
                pending.info.title
            )));
        }
        course.lectures.push(next_id);
        self.lectures.push(Lecture {
            course: course_id,
            lecture_num: count + 1,
            info: pending.info,
            videos: Vec::new(),
        });
        Ok(next_id)
    }

    pub fn attach_video(&mut self, lecture_id: LectureId, mut video: Video) -> AppResult<VideoId> {
        if let Some(owner) = video.lecture {
            return Err(AppError::OwnershipViolation(format!(
                "视频 {} 已属于课时 {:?}，不能再加入课时 {:?}",
                video.variant, owner, lecture_id
            )));
        }
        let next_id = VideoId(self.videos.len());
        let lecture = self
            .lectures
            .get(lecture_id.0)
            .ok_or_else(|| AppError::OwnershipViolation(format!("课时 {:?} 不存在", lecture_id)))?;
        if lecture
            .videos
            .iter()
            .any(|id| self.videos[id.0].variant == video.variant)
        {
            return Err(AppError::OwnershipViolation(format!(
                "课时 {:?} 中已存在视频变体 {}",
                lecture_id, video.variant
            )));
        }
        video.lecture = Some(lecture_id);
        self.videos.push(video);
        self.lectures[lecture_id.0].videos.push(next_id);
        Ok(next_id)
    }

    /// 用下载任务返回的副本替换目录中的视频记录。副本必须仍属于同一课时、同一变体。
    pub fn update_video(&mut self, id: VideoId, updated: Video) -> AppResult<()> {
        let current = self
            .videos
            .get_mut(id.0)
            .ok_or_else(|| AppError::OwnershipViolation(format!("视频 {:?} 不存在", id)))?;
        if current.lecture != updated.lecture || current.variant != updated.variant {
            return Err(AppError::OwnershipViolation(format!(
                "视频 {:?} 的更新记录与原记录归属不一致",
                id
            )));
        }
        *current = updated;
        Ok(())
    }

    pub fn course(&self, id: CourseId) -> AppResult<&Course> {
        self.courses
            .get(id.0)
            .ok_or_else(|| AppError::OwnershipViolation(format!("课程 {:?} 不存在", id)))
    }

    fn course_mut(&mut self, id: CourseId) -> AppResult<&mut Course> {
        self.courses
            .get_mut(id.0)
            .ok_or_else(|| AppError::OwnershipViolation(format!("课程 {:?} 不存在", id)))
    }

    pub fn lecture(&self, id: LectureId) -> AppResult<&Lecture> {
        self.lectures
            .get(id.0)
            .ok_or_else(|| AppError::OwnershipViolation(format!("课时 {:?} 不存在", id)))
    }

    pub fn video(&self, id: VideoId) -> AppResult<&Video> {
        self.videos
            .get(id.0)
            .ok_or_else(|| AppError::OwnershipViolation(format!("视频 {:?} 不存在", id)))
    }

    pub fn courses(&self) -> impl Iterator<Item = (CourseId, &Course)> {
        self.courses.iter().enumerate().map(|(i, c)| (CourseId(i), c))
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    pub fn lecture_count(&self) -> usize {
        self.lectures.len()
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// 所有已解析出下载地址的视频 (按加入顺序)。
    pub fn resolved_videos(&self) -> Vec<(VideoId, &Video)> {
        self.videos
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_resolved())
            .map(|(i, v)| (VideoId(i), v))
            .collect()
    }

    /// 构建视频对应的本地文件名。
    pub fn file_name_for(&self, id: VideoId, extension: &str) -> AppResult<String> {
        let video = self.video(id)?;
        let lecture_id = video.lecture.ok_or_else(|| {
            AppError::OwnershipViolation(format!("视频 {:?} 尚未归属任何课时", id))
        })?;
        let lecture = self.lecture(lecture_id)?;
        let course = self.course(lecture.course)?;
        Ok(crate::utils::lecture_file_name(
            &course.course_codes,
            lecture.lecture_num,
            lecture.info.date,
            lecture.info.start_time,
            video.variant,
            extension,
        ))
    }
}
