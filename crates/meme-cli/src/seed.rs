//! Sample data for a fresh calendar: the "hachimi" meme, the two figures
//! behind it, and the records they own.

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use meme_core::{
  event::NewEvent,
  pantheon::{NewArtifact, NewFigure, NewHistoricalEvent, NewTimelineEntry},
  store::EventStore,
};
use meme_store_sqlite::Calendar;
use serde::Serialize;

#[derive(Debug, Default, Serialize)]
pub struct SeedSummary {
  pub figures:    usize,
  pub events:     usize,
  pub artifacts:  usize,
  pub timeline:   usize,
  pub historical: usize,
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
  NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {y}-{m}-{d}"))
}

fn strings(items: &[&str]) -> Vec<String> { items.iter().map(|s| (*s).to_owned()).collect() }

pub fn seed(cal: &mut Calendar) -> Result<SeedSummary> {
  let mut summary = SeedSummary::default();

  // ── Figures ───────────────────────────────────────────────────────────────

  let teio = cal
    .add_figure(NewFigure {
      alias: strings(&["Tokai Teio", "帝宝"]),
      birth_date: Some(date(1992, 3, 20)?),
      birth_place: Some("日本".into()),
      description: Some("《赛马娘》中的角色，哈基米梗的起源".into()),
      bio: Some("日本名马东海帝王的拟人化角色，动画中哼唱蜂蜜水之歌的片段催生了哈基米梗".into()),
      categories: strings(&["二次元", "虚拟偶像", "赛马娘"]),
      tags: strings(&["蜂蜜水", "哈基米起源"]),
      influence_score: 85,
      popularity_level: Some("high".into()),
      avatar_url: Some("https://example.com/tokai_teio.jpg".into()),
      media_urls: strings(&["https://example.com/hachimi_clip.mp4"]),
      ..NewFigure::new("东海帝王")
    })
    .context("adding figure 东海帝王")?;
  let remixer = cal
    .add_figure(NewFigure {
      alias: strings(&["鬼畜创作者"]),
      description: Some("将哈基米旋律二次创作成鬼畜神曲的B站UP主".into()),
      categories: strings(&["UP主", "鬼畜创作者"]),
      tags: strings(&["二次创作", "鬼畜", "B站"]),
      influence_score: 75,
      popularity_level: Some("medium".into()),
      ..NewFigure::new("京桥刹那")
    })
    .context("adding figure 京桥刹那")?;
  summary.figures = 2;

  // ── Events ────────────────────────────────────────────────────────────────

  let samples = [
    (
      date(2021, 2, 15)?,
      "哈基米起源：赛马娘蜂蜜水之歌",
      "《赛马娘》中东海帝王哼唱蜂蜜水的魔性片段",
      &["二次元", "动画", "音乐"][..],
      &["哈基米", "赛马娘", "蜂蜜水", "东海帝王"][..],
      "high",
      90,
      &["B站", "Niconico"][..],
      &teio.id,
      Some("「はちみ」因发音可爱被中文观众音译为哈基米，此时仍指蜂蜜水本身。"),
    ),
    (
      date(2022, 5, 10)?,
      "哈基米鬼畜神曲诞生",
      "哼唱旋律被二次创作成鬼畜洗脑曲",
      &["鬼畜", "二次创作", "音乐"][..],
      &["哈基米", "鬼畜", "二次创作", "B站"][..],
      "high",
      95,
      &["B站"][..],
      &remixer.id,
      None,
    ),
    (
      date(2023, 3, 20)?,
      "哈基米萌宠视频走红",
      "神曲成为短视频平台萌宠视频的标配BGM",
      &["萌宠", "短视频", "音乐"][..],
      &["哈基米", "猫咪", "萌宠", "抖音"][..],
      "very_high",
      98,
      &["抖音", "B站"][..],
      &teio.id,
      Some("随着萌宠视频的传播，哈基米逐渐脱离蜂蜜水的字面义，被用来指代可爱的猫咪。"),
    ),
    (
      date(2023, 6, 15)?,
      "哈基米误用与圈层冲突",
      "圈外用户的误用引发原梗参与者的不满",
      &["网络文化", "圈层冲突", "语义演变"][..],
      &["哈基米", "误用", "圈层冲突"][..],
      "high",
      88,
      &["贴吧", "微博", "B站"][..],
      &teio.id,
      None,
    ),
  ];

  let mut first_event = None;
  for (day, title, description, categories, keywords, level, heat, sources, figure, literature) in
    samples
  {
    let event = cal
      .add_event(NewEvent {
        description: Some(description.into()),
        event_type: Some("meme".into()),
        categories: Some(strings(categories)),
        keywords: Some(strings(keywords)),
        heat_level: Some(level.into()),
        heat_score: Some(heat),
        sources: Some(strings(sources)),
        figure_id: Some(figure.clone()),
        literature_content: literature.map(str::to_owned),
        ..NewEvent::new(title, day)
      })
      .with_context(|| format!("adding event {title}"))?;
    first_event.get_or_insert(event.id);
    summary.events += 1;
  }

  // ── Owned records ─────────────────────────────────────────────────────────

  cal.add_artifact(NewArtifact {
    artifact_type: Some("视频作品".into()),
    content: Some("动画中东海帝王哼唱蜂蜜水的原始片段".into()),
    occurrence_date: Some(date(2021, 2, 15)?),
    date_accuracy: Some("exact".into()),
    source: Some("《赛马娘》动画".into()),
    is_verified: true,
    significance_level: Some("high".into()),
    ..NewArtifact::new(&teio.id, "蜂蜜水之歌原片")
  })?;
  cal.add_artifact(NewArtifact {
    artifact_type: Some("二次创作".into()),
    occurrence_date: Some(date(2022, 5, 10)?),
    date_accuracy: Some("exact".into()),
    source: Some("B站".into()),
    is_verified: true,
    significance_level: Some("high".into()),
    ..NewArtifact::new(&remixer.id, "《哈基米哈基米我那类撸多》")
  })?;
  summary.artifacts = 2;

  cal.add_timeline_entry(NewTimelineEntry {
    importance: Some("major".into()),
    event_type: Some("birth".into()),
    ..NewTimelineEntry::new(&teio.id, 1992, "东海帝王出生")
  })?;
  cal.add_timeline_entry(NewTimelineEntry {
    importance: Some("major".into()),
    event_type: Some("career".into()),
    ..NewTimelineEntry::new(&teio.id, 2021, "赛马娘动画播出")
  })?;
  summary.timeline = 2;

  cal.add_historical_event(NewHistoricalEvent {
    description: Some("动画中东海帝王哼唱蜂蜜水，哈基米梗由此起源".into()),
    event_type: Some("cultural".into()),
    categories: strings(&["互联网文化", "二次元"]),
    importance_level: Some("high".into()),
    location: Some("日本".into()),
    related_figure_ids: vec![teio.id.clone()],
    related_event_ids: first_event.into_iter().collect(),
    ..NewHistoricalEvent::new("哈基米文化现象诞生", date(2021, 2, 15)?)
  })?;
  summary.historical = 1;

  tracing::info!(?summary, "seeded sample data");
  Ok(summary)
}
